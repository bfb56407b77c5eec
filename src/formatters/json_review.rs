use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::core::{DiagnosticLevel, Module};

/// JSON review document: every package with its tokens and diagnostics
pub struct JsonReviewFormatter {
    /// Include token structure next to the rendered text
    detailed: bool,
    pretty: bool,
}

impl JsonReviewFormatter {
    pub fn new() -> Self {
        Self {
            detailed: false,
            pretty: false,
        }
    }

    pub fn with_detail(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format_to_file(&self, module: &Module, output_path: &Path) -> Result<()> {
        let content = self.format_module(module)?;
        fs::write(output_path, content)?;
        Ok(())
    }

    pub fn format_module(&self, module: &Module) -> Result<String> {
        let value = self.to_value(module)?;
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    pub fn to_value(&self, module: &Module) -> Result<Value> {
        let mut packages = Vec::with_capacity(module.packages().len());
        let mut tokens_total = 0usize;
        let mut warnings = 0usize;
        let mut diagnostics_total = 0usize;

        for (import_path, pkg) in module.packages() {
            let mut tokens = Vec::with_capacity(pkg.content().len());
            for token in pkg.content().tokens() {
                let mut token_json = json!({
                    "id": token.id(),
                    "text": token.to_string(),
                });
                if let Some(origin) = &token.origin {
                    token_json["origin"] = json!(origin);
                }
                if self.detailed {
                    token_json["detail"] = serde_json::to_value(token)?;
                }
                tokens.push(token_json);
            }
            tokens_total += tokens.len();

            let diagnostics: Vec<Value> = pkg
                .diagnostics()
                .iter()
                .map(|diagnostic| {
                    json!({
                        "level": diagnostic.level,
                        "target": diagnostic.target_id,
                        "text": diagnostic.text,
                    })
                })
                .collect();
            diagnostics_total += diagnostics.len();
            warnings += pkg
                .diagnostics()
                .iter()
                .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Warning)
                .count();

            packages.push(json!({
                "import_path": import_path,
                "name": pkg.name(),
                "tokens": tokens,
                "diagnostics": diagnostics,
            }));
        }

        Ok(json!({
            "meta": {
                "module": module.name(),
                "module_path": module.module_path(),
                "packages": packages.len(),
                "tokens": tokens_total,
                "diagnostics": diagnostics_total,
                "warnings": warnings,
                "format": if self.detailed { "detailed" } else { "compact" },
            },
            "packages": packages,
            "resolution": module.resolution_events(),
        }))
    }
}

impl Default for JsonReviewFormatter {
    fn default() -> Self {
        Self::new()
    }
}
