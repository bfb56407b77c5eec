use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "go.mod";

/// Reads `<dir>/go.mod` and returns the module's import path.
pub fn read_module_path(dir: &Path) -> Result<String> {
    let path = dir.join(MANIFEST_FILE);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_module_path(&content).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_module_path(content: &str) -> Result<String> {
    let directive = Regex::new(r#"(?m)^\s*module\s+(?:"([^"]+)"|([^\s/"]\S*?))\s*(?://.*)?$"#)?;
    let captures = directive
        .captures(content)
        .ok_or_else(|| anyhow::anyhow!("no module directive"))?;
    let module_path = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow::anyhow!("empty module directive"))?;
    Ok(module_path)
}

/// Import path prefix shared by the module's packages: the module path's
/// parent plus `/`, or empty for single-segment module paths.
pub fn base_import_path(module_path: &str) -> String {
    match module_path.rfind('/') {
        Some(idx) => format!("{}/", &module_path[..idx]),
        None => String::new(),
    }
}
