use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tree_sitter::Tree;

use super::{Content, Diagnostic};
use crate::parsers::go::{self, FileDeclarations};
use crate::parsers::PackageError;

/// One parsed Go source file of a package.
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("bytes", &self.source.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// `None` for embedded fields
    pub name: Option<String>,
    pub type_text: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub name: String,
    /// Parameters and results, e.g. `(ctx context.Context) error`
    pub signature: String,
}

/// Syntactic shape of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Interface {
        methods: Vec<Method>,
        embedded: Vec<String>,
    },
    Struct {
        fields: Vec<Field>,
    },
    /// A type defined as another named type, `type X Y`
    SimpleAlias(String),
    /// Anything else: maps, funcs, selector types, generics...
    Other { kind: String, text: String },
}

/// An entry in a package's `types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Name of the owning package
    pub package: String,
    pub name: String,
    pub shape: TypeShape,
}

/// Declaration index of a single package directory.
#[derive(Debug)]
pub struct Pkg {
    name: String,
    dir: PathBuf,
    files: Vec<SourceFile>,
    indexed: bool,
    pub(crate) types: BTreeMap<String, Declaration>,
    pub(crate) type_aliases: BTreeMap<String, String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) content: Content,
}

impl Pkg {
    pub fn new(dir: &Path, name: &str, files: Vec<SourceFile>) -> Self {
        Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            files,
            indexed: false,
            types: BTreeMap::new(),
            type_aliases: BTreeMap::new(),
            diagnostics: Vec::new(),
            content: Content::default(),
        }
    }

    /// Builds a package from in-memory `(path, source)` pairs.
    pub fn from_sources(
        dir: &Path,
        name: &str,
        sources: Vec<(PathBuf, String)>,
    ) -> Result<Self, PackageError> {
        let files = go::parse_sources(sources)?;
        Ok(Self::new(dir, name, files))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn types(&self) -> &BTreeMap<String, Declaration> {
        &self.types
    }

    pub fn type_aliases(&self) -> &BTreeMap<String, String> {
        &self.type_aliases
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Populates `types` and `type_aliases` from the parsed files and adds
    /// a token for every declared type. Returns `false` if already indexed.
    pub fn index(&mut self) -> bool {
        if self.indexed {
            return false;
        }
        self.indexed = true;

        for file in &self.files {
            let FileDeclarations { types, aliases } =
                go::collect_declarations(&file.tree, file.source.as_bytes());
            for (name, shape) in types {
                let declaration = Declaration {
                    package: self.name.clone(),
                    name: name.clone(),
                    shape,
                };
                self.types.insert(name, declaration);
            }
            self.type_aliases.extend(aliases);
        }

        for declaration in self.types.values() {
            let package = self.name.as_str();
            let name = declaration.name.as_str();
            match &declaration.shape {
                TypeShape::Interface { methods, embedded } => {
                    self.content
                        .add_interface(None, name, package, methods, embedded);
                }
                TypeShape::Struct { fields } => {
                    self.content.add_struct(None, name, package, fields);
                }
                TypeShape::SimpleAlias(underlying) => {
                    self.content.add_simple_type(None, name, package, underlying);
                }
                TypeShape::Other { text, .. } => {
                    self.content.add_simple_type(None, name, package, text);
                }
            }
        }

        tracing::debug!(
            package = %self.name,
            types = self.types.len(),
            aliases = self.type_aliases.len(),
            "indexed package"
        );
        true
    }
}

/// `module_name` followed by `relative`, the package directory below the
/// module root, joined with `/`.
pub fn package_name(module_name: &str, relative: &Path) -> String {
    let mut name = module_name.trim_end_matches('/').to_string();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}
