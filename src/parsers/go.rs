use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node as TSNode, Tree};

use super::common::{
    collapse_whitespace, extract_text, find_child_by_kind, find_children_by_kind, is_exported,
    read_source, TreeSitterParser,
};
use super::{PackageError, PackageParser};
use crate::core::{Field, Method, Pkg, SourceFile, TypeShape};

/// Reads the non-test `.go` files of one directory.
pub struct GoPackageParser;

impl GoPackageParser {
    pub fn new() -> Self {
        Self
    }

    fn source_paths(&self, dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
        let entries = fs::read_dir(dir).map_err(|source| PackageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PackageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_source = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.ends_with(".go") && !name.ends_with("_test.go"));
            if is_source && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl Default for GoPackageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageParser for GoPackageParser {
    fn parse_package(&self, dir: &Path, package_name: &str) -> Result<Pkg, PackageError> {
        let paths = self.source_paths(dir)?;
        if paths.is_empty() {
            return Err(PackageError::NoPackages(dir.to_path_buf()));
        }

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let source = read_source(&path).map_err(|source| PackageError::Io {
                path: path.clone(),
                source,
            })?;
            sources.push((path, source));
        }

        let files = parse_sources(sources)?;
        if files.is_empty() {
            return Err(PackageError::NoPackages(dir.to_path_buf()));
        }
        Ok(Pkg::new(dir, package_name, files))
    }
}

fn new_parser(path: &Path) -> Result<TreeSitterParser, PackageError> {
    TreeSitterParser::new(tree_sitter_go::language()).map_err(|err| PackageError::Parse {
        path: path.to_path_buf(),
        message: format!("{err:#}"),
    })
}

/// Parses Go sources, keeping only files of the first file's package.
pub fn parse_sources(sources: Vec<(PathBuf, String)>) -> Result<Vec<SourceFile>, PackageError> {
    let Some((first, _)) = sources.first() else {
        return Ok(Vec::new());
    };
    let mut parser = new_parser(first)?;
    let mut files: Vec<SourceFile> = Vec::with_capacity(sources.len());
    let mut package: Option<String> = None;

    for (path, source) in sources {
        let tree = parser
            .parse_source(&source, &path)
            .map_err(|err| PackageError::Parse {
                path: path.clone(),
                message: format!("{err:#}"),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(&root).unwrap_or(1);
            return Err(PackageError::Parse {
                path,
                message: format!("syntax error near line {line}"),
            });
        }

        if let Some(name) = package_clause(&root, source.as_bytes()) {
            if package.is_none() {
                package = Some(name);
            } else if package.as_deref() != Some(name.as_str()) {
                tracing::debug!(
                    file = %path.display(),
                    package = %name,
                    expected = ?package,
                    "ignoring file from another package"
                );
                continue;
            }
        }

        files.push(SourceFile { path, source, tree });
    }

    Ok(files)
}

fn first_error_line(node: &TSNode) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<TSNode> = node.children(&mut cursor).collect();
    children
        .iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}

fn package_clause(root: &TSNode, source: &[u8]) -> Option<String> {
    let clause = find_child_by_kind(root, "package_clause")?;
    let identifier = find_child_by_kind(&clause, "package_identifier")?;
    Some(extract_text(&identifier, source).to_string())
}

/// Exported type declarations of one file.
#[derive(Debug, Default)]
pub struct FileDeclarations {
    pub types: Vec<(String, TypeShape)>,
    /// local name -> `<import path>.<TypeName>`
    pub aliases: Vec<(String, String)>,
}

pub fn collect_declarations(tree: &Tree, source: &[u8]) -> FileDeclarations {
    let root = tree.root_node();
    let imports = collect_imports(&root, source);
    let mut declarations = FileDeclarations::default();

    for type_decl in find_children_by_kind(&root, "type_declaration") {
        let mut cursor = type_decl.walk();
        let specs: Vec<TSNode> = type_decl
            .named_children(&mut cursor)
            .filter(|child| matches!(child.kind(), "type_spec" | "type_alias"))
            .collect();
        for spec in specs {
            process_type_spec(&spec, source, &imports, &mut declarations);
        }
    }

    declarations
}

fn process_type_spec(
    spec: &TSNode,
    source: &[u8],
    imports: &HashMap<String, String>,
    declarations: &mut FileDeclarations,
) {
    let (Some(name_node), Some(type_node)) = (
        spec.child_by_field_name("name"),
        spec.child_by_field_name("type"),
    ) else {
        return;
    };
    let name = extract_text(&name_node, source);
    if !is_exported(name) {
        return;
    }

    if spec.kind() == "type_alias" && type_node.kind() == "qualified_type" {
        if let (Some(package), Some(type_name)) = (
            type_node.child_by_field_name("package"),
            type_node.child_by_field_name("name"),
        ) {
            let package = extract_text(&package, source);
            let import_path = imports
                .get(package)
                .map(String::as_str)
                .unwrap_or(package);
            let qualified = format!("{}.{}", import_path, extract_text(&type_name, source));
            declarations.aliases.push((name.to_string(), qualified));
            return;
        }
    }

    let shape = classify(&type_node, source);
    declarations.types.push((name.to_string(), shape));
}

fn classify(type_node: &TSNode, source: &[u8]) -> TypeShape {
    match type_node.kind() {
        "interface_type" => {
            let mut methods = Vec::new();
            let mut embedded = Vec::new();
            collect_interface_elements(type_node, source, &mut methods, &mut embedded);
            TypeShape::Interface { methods, embedded }
        }
        "struct_type" => TypeShape::Struct {
            fields: collect_fields(type_node, source),
        },
        "type_identifier" => TypeShape::SimpleAlias(extract_text(type_node, source).to_string()),
        kind => TypeShape::Other {
            kind: kind.to_string(),
            text: collapse_whitespace(extract_text(type_node, source)),
        },
    }
}

// Older grammars wrap elements in `method_spec_list`; newer ones use
// `method_elem`/`type_elem` directly under the interface.
fn collect_interface_elements(
    node: &TSNode,
    source: &[u8],
    methods: &mut Vec<Method>,
    embedded: &mut Vec<String>,
) {
    let mut cursor = node.walk();
    let children: Vec<TSNode> = node.named_children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "method_spec_list" => collect_interface_elements(&child, source, methods, embedded),
            "method_spec" | "method_elem" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let signature = std::str::from_utf8(&source[name.end_byte()..child.end_byte()])
                        .unwrap_or("");
                    methods.push(Method {
                        name: extract_text(&name, source).to_string(),
                        signature: collapse_whitespace(signature),
                    });
                }
            }
            "comment" => {}
            _ => embedded.push(collapse_whitespace(extract_text(&child, source))),
        }
    }
}

fn collect_fields(struct_node: &TSNode, source: &[u8]) -> Vec<Field> {
    let Some(list) = find_child_by_kind(struct_node, "field_declaration_list") else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for declaration in find_children_by_kind(&list, "field_declaration") {
        let tag = declaration
            .child_by_field_name("tag")
            .map(|tag| extract_text(&tag, source).to_string());

        let mut cursor = declaration.walk();
        let names: Vec<String> = declaration
            .children_by_field_name("name", &mut cursor)
            .map(|name| extract_text(&name, source).to_string())
            .collect();

        if names.is_empty() {
            // embedded: everything before the tag, `*` included
            let end = declaration
                .child_by_field_name("tag")
                .map_or(declaration.end_byte(), |tag| tag.start_byte());
            let text = std::str::from_utf8(&source[declaration.start_byte()..end]).unwrap_or("");
            fields.push(Field {
                name: None,
                type_text: collapse_whitespace(text),
                tag,
            });
            continue;
        }

        let type_text = declaration
            .child_by_field_name("type")
            .map(|node| collapse_whitespace(extract_text(&node, source)))
            .unwrap_or_default();
        for name in names {
            fields.push(Field {
                name: Some(name),
                type_text: type_text.clone(),
                tag: tag.clone(),
            });
        }
    }
    fields
}

/// Maps the identifier each import is referenced by to its import path.
fn collect_imports(root: &TSNode, source: &[u8]) -> HashMap<String, String> {
    let mut imports = HashMap::new();
    for declaration in find_children_by_kind(root, "import_declaration") {
        let mut specs = find_children_by_kind(&declaration, "import_spec");
        if let Some(list) = find_child_by_kind(&declaration, "import_spec_list") {
            specs.extend(find_children_by_kind(&list, "import_spec"));
        }

        for spec in specs {
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = extract_text(&path_node, source)
                .trim_matches(|c| c == '"' || c == '`')
                .to_string();
            let name = match spec.child_by_field_name("name") {
                Some(name) if name.kind() == "package_identifier" => {
                    extract_text(&name, source).to_string()
                }
                // dot and blank imports are never used as qualifiers
                Some(_) => continue,
                None => default_import_name(&path).to_string(),
            };
            imports.insert(name, path);
        }
    }
    imports
}

/// Last path segment, skipping a trailing major version like `v2`.
pub fn default_import_name(import_path: &str) -> &str {
    let mut segments = import_path.rsplit('/');
    let last = segments.next().unwrap_or(import_path);
    let is_major_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    if is_major_version {
        if let Some(previous) = segments.next() {
            return previous;
        }
    }
    last
}
