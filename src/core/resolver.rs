use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::{Diagnostic, DiagnosticLevel, Field, Method, Pkg, TypeShape};
use crate::parsers::PackageParser;

/// Directory holding sibling modules, plus the import-path marker that maps
/// an import path onto a directory below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot {
    dir: PathBuf,
    import_marker: String,
}

impl WorkspaceRoot {
    pub fn new(dir: impl Into<PathBuf>, import_marker: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            import_marker: import_marker.into(),
        }
    }

    /// Roots the workspace at the outermost directory named `dir_name` above
    /// `module_dir`. Returns `None` when the module does not live below one.
    pub fn locate(module_dir: &Path, dir_name: &str, import_marker: &str) -> Option<Self> {
        if dir_name.is_empty() {
            return None;
        }
        let needle = Component::Normal(OsStr::new(dir_name));
        let mut dir = PathBuf::new();
        let mut components = module_dir.components().peekable();
        while let Some(component) = components.next() {
            dir.push(component);
            if component == needle && components.peek().is_some() {
                return Some(Self::new(dir, import_marker));
            }
        }
        None
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory and workspace-relative name of the package `import_path`.
    pub fn package_dir(&self, import_path: &str) -> Option<(PathBuf, String)> {
        if self.import_marker.is_empty() {
            return None;
        }
        let (_, relative) = import_path.split_once(&self.import_marker)?;
        if relative.is_empty() {
            return None;
        }
        Some((self.dir.join(relative), relative.to_string()))
    }
}

/// Packages outside the module, indexed on demand while resolving aliases.
///
/// Failed attempts are remembered, so each import path is parsed at most once
/// per resolution pass.
#[derive(Debug, Default)]
pub struct ExternalPackages {
    packages: HashMap<String, Result<Pkg, String>>,
}

impl ExternalPackages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, import_path: &str) -> Option<&Pkg> {
        self.packages.get(import_path)?.as_ref().ok()
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.packages.contains_key(import_path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn get_or_index<F>(&mut self, import_path: &str, load: F) -> Result<&Pkg, String>
    where
        F: FnOnce() -> Result<Pkg, String>,
    {
        let entry = self
            .packages
            .entry(import_path.to_string())
            .or_insert_with(|| {
                load().map(|mut pkg| {
                    pkg.index();
                    pkg
                })
            });
        match entry {
            Ok(pkg) => Ok(&*pkg),
            Err(message) => Err(message.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum PlaceholderReason {
    /// No package for the import path could be located
    Unreachable,
    /// The origin package was located but failed to parse
    ExternalParseFailed(String),
    /// The origin declaration has a shape that cannot be hoisted
    UnexpectedShape(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved,
    Placeholder(PlaceholderReason),
    /// The origin package has no such declaration; nothing was hoisted
    Skipped,
}

/// What happened to one alias during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionEvent {
    pub package: String,
    pub alias: String,
    pub qualified_name: String,
    #[serde(flatten)]
    pub outcome: ResolutionOutcome,
}

impl fmt::Display for ResolutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = format!("{}.{} = {}", self.package, self.alias, self.qualified_name);
        match &self.outcome {
            ResolutionOutcome::Resolved => write!(f, "resolved {}", target),
            ResolutionOutcome::Placeholder(PlaceholderReason::Unreachable) => {
                write!(f, "no definition reachable for {}", target)
            }
            ResolutionOutcome::Placeholder(PlaceholderReason::ExternalParseFailed(err)) => {
                write!(f, "couldn't parse origin of {}: {}", target, err)
            }
            ResolutionOutcome::Placeholder(PlaceholderReason::UnexpectedShape(kind)) => {
                write!(f, "unexpected node type {} for {}", kind, target)
            }
            ResolutionOutcome::Skipped => write!(f, "found no definition for {}", target),
        }
    }
}

/// Severity and display name of an alias diagnostic.
///
/// The qualified name is searched for the module name as a raw substring; on
/// a hit the alias is local and the name is shortened to the text after it.
pub fn alias_origin(qualified_name: &str, module_name: &str) -> (DiagnosticLevel, String) {
    match qualified_name.split_once(module_name) {
        Some((_, after)) => (
            DiagnosticLevel::Info,
            after.strip_prefix('/').unwrap_or(after).to_string(),
        ),
        None => (DiagnosticLevel::Warning, qualified_name.to_string()),
    }
}

enum HoistShape {
    Simple(String),
    Interface {
        origin: String,
        methods: Vec<Method>,
        embedded: Vec<String>,
    },
    Struct {
        origin: String,
        fields: Vec<Field>,
    },
}

struct Hoist {
    alias: String,
    level: DiagnosticLevel,
    display_name: String,
    shape: HoistShape,
}

impl Hoist {
    fn apply(self, pkg: &mut Pkg) {
        let package = pkg.name().to_string();
        let token = match &self.shape {
            HoistShape::Simple(underlying) => {
                pkg.content
                    .add_simple_type(None, &self.alias, &package, underlying)
            }
            HoistShape::Interface {
                origin,
                methods,
                embedded,
            } => pkg.content.add_interface(
                Some(origin.as_str()),
                &self.alias,
                &package,
                methods,
                embedded,
            ),
            HoistShape::Struct { origin, fields } => {
                pkg.content
                    .add_struct(Some(origin.as_str()), &self.alias, &package, fields)
            }
        };
        let target_id = token.id().to_string();
        pkg.diagnostics
            .push(Diagnostic::alias_for(self.level, target_id, &self.display_name));
    }
}

enum SourceLookup<'p> {
    Found(&'p Pkg),
    Unreachable,
    Failed(String),
}

/// Hoists the definitions behind type aliases into the aliasing packages.
pub struct AliasResolver<'a> {
    module_name: &'a str,
    parser: &'a dyn PackageParser,
    workspace: Option<&'a WorkspaceRoot>,
}

impl<'a> AliasResolver<'a> {
    pub fn new(module_name: &'a str, parser: &'a dyn PackageParser) -> Self {
        Self {
            module_name,
            parser,
            workspace: None,
        }
    }

    pub fn with_workspace(mut self, workspace: Option<&'a WorkspaceRoot>) -> Self {
        self.workspace = workspace;
        self
    }

    /// Resolves every alias of every package. Origins are looked up by import
    /// path, so the result for one alias never depends on the others.
    pub fn resolve_all(
        &self,
        packages: &mut BTreeMap<String, Pkg>,
        external: &mut ExternalPackages,
    ) -> Vec<ResolutionEvent> {
        let mut hoists = Vec::new();
        let mut events = Vec::new();

        for (key, pkg) in packages.iter() {
            for (alias, qualified_name) in pkg.type_aliases() {
                let (hoist, outcome) = self.plan(alias, qualified_name, packages, external);
                if let Some(hoist) = hoist {
                    hoists.push((key.clone(), hoist));
                }
                events.push(ResolutionEvent {
                    package: pkg.name().to_string(),
                    alias: alias.clone(),
                    qualified_name: qualified_name.clone(),
                    outcome,
                });
            }
        }

        for (key, hoist) in hoists {
            if let Some(pkg) = packages.get_mut(&key) {
                hoist.apply(pkg);
            }
        }

        events
    }

    fn plan(
        &self,
        alias: &str,
        qualified_name: &str,
        packages: &BTreeMap<String, Pkg>,
        external: &mut ExternalPackages,
    ) -> (Option<Hoist>, ResolutionOutcome) {
        let (import_path, type_name) = qualified_name
            .rsplit_once('.')
            .unwrap_or(("", qualified_name));
        let (level, display_name) = alias_origin(qualified_name, self.module_name);

        let placeholder = |reason: PlaceholderReason| {
            let hoist = Hoist {
                alias: alias.to_string(),
                level,
                display_name: display_name.clone(),
                shape: HoistShape::Simple(display_name.clone()),
            };
            (Some(hoist), ResolutionOutcome::Placeholder(reason))
        };

        let source = match self.locate(import_path, packages, external) {
            SourceLookup::Found(pkg) => pkg,
            SourceLookup::Unreachable => return placeholder(PlaceholderReason::Unreachable),
            SourceLookup::Failed(err) => {
                return placeholder(PlaceholderReason::ExternalParseFailed(err))
            }
        };

        let Some(declaration) = source.types().get(type_name) else {
            tracing::debug!(qualified_name, "found no definition");
            return (None, ResolutionOutcome::Skipped);
        };

        let shape = match &declaration.shape {
            TypeShape::Interface { methods, embedded } => HoistShape::Interface {
                origin: declaration.package.clone(),
                methods: methods.clone(),
                embedded: embedded.clone(),
            },
            TypeShape::Struct { fields } => HoistShape::Struct {
                origin: declaration.package.clone(),
                fields: fields.clone(),
            },
            TypeShape::SimpleAlias(underlying) => HoistShape::Simple(underlying.clone()),
            TypeShape::Other { kind, .. } => {
                tracing::debug!(qualified_name, kind = %kind, "unexpected node type");
                return placeholder(PlaceholderReason::UnexpectedShape(kind.clone()));
            }
        };

        let hoist = Hoist {
            alias: alias.to_string(),
            level,
            display_name,
            shape,
        };
        (Some(hoist), ResolutionOutcome::Resolved)
    }

    fn locate<'p>(
        &self,
        import_path: &str,
        packages: &'p BTreeMap<String, Pkg>,
        external: &'p mut ExternalPackages,
    ) -> SourceLookup<'p> {
        if let Some(pkg) = packages.get(import_path) {
            return SourceLookup::Found(pkg);
        }

        let located = self
            .workspace
            .and_then(|workspace| workspace.package_dir(import_path));
        if !external.contains(import_path) && located.is_none() {
            return SourceLookup::Unreachable;
        }

        let result = external.get_or_index(import_path, || {
            let Some((dir, relative)) = located else {
                return Err(format!("no directory for {}", import_path));
            };
            tracing::debug!(import_path, dir = %dir.display(), "indexing external package");
            self.parser
                .parse_package(&dir, &relative)
                .map_err(|err| err.to_string())
        });
        match result {
            Ok(pkg) => SourceLookup::Found(pkg),
            Err(err) => SourceLookup::Failed(err),
        }
    }
}
