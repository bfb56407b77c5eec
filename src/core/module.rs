use anyhow::{bail, Context, Result};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::manifest::{base_import_path, read_module_path};
use super::resolver::{AliasResolver, ExternalPackages, ResolutionEvent, WorkspaceRoot};
use super::scanner::{is_testdata, DirectorySource, WalkDirSource};
use super::package::package_name;
use super::Pkg;
use crate::parsers::go::GoPackageParser;
use crate::parsers::PackageParser;

pub const DEFAULT_WORKSPACE_DIR: &str = "sdk";
pub const DEFAULT_WORKSPACE_IMPORT_MARKER: &str = "azure-sdk-for-go/sdk/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Index `testdata` directories too. Only tests want this.
    pub index_testdata: bool,
    /// Name of the directory all sibling modules live in
    pub workspace_dir_name: String,
    /// Import path text after which a path maps onto the workspace directory
    pub workspace_import_marker: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            index_testdata: false,
            workspace_dir_name: DEFAULT_WORKSPACE_DIR.to_string(),
            workspace_import_marker: DEFAULT_WORKSPACE_IMPORT_MARKER.to_string(),
        }
    }
}

/// The public API of one Go module.
#[derive(Debug)]
pub struct Module {
    name: String,
    module_path: String,
    /// import path -> package
    packages: BTreeMap<String, Pkg>,
    resolution_events: Vec<ResolutionEvent>,
    external_packages: usize,
}

impl Module {
    /// Indexes the module at `dir` with the default parser and configuration.
    pub fn build(dir: &Path) -> Result<Self> {
        ModuleIndexer::new().build(dir)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Import path from the module's `go.mod`
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn packages(&self) -> &BTreeMap<String, Pkg> {
        &self.packages
    }

    pub fn package(&self, import_path: &str) -> Option<&Pkg> {
        self.packages.get(import_path)
    }

    pub fn resolution_events(&self) -> &[ResolutionEvent] {
        &self.resolution_events
    }

    /// Number of packages outside the module indexed to resolve aliases
    pub fn external_package_count(&self) -> usize {
        self.external_packages
    }
}

pub struct ModuleIndexer {
    config: IndexerConfig,
    parser: Box<dyn PackageParser>,
    directories: Box<dyn DirectorySource>,
}

impl ModuleIndexer {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
            parser: Box::new(GoPackageParser::new()),
            directories: Box::new(WalkDirSource::new()),
        }
    }

    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_parser(mut self, parser: impl PackageParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_directories(mut self, directories: impl DirectorySource + 'static) -> Self {
        self.directories = Box::new(directories);
        self
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn build(&self, dir: &Path) -> Result<Module> {
        let module_path = read_module_path(dir)?;
        let name = module_name(dir)?;
        let workspace = WorkspaceRoot::locate(
            &absolute(dir)?,
            &self.config.workspace_dir_name,
            &self.config.workspace_import_marker,
        );
        if let Some(workspace) = &workspace {
            tracing::debug!(root = %workspace.dir().display(), "workspace root");
        } else {
            tracing::debug!("no workspace root; external modules stay unresolved");
        }

        let base_import_path = base_import_path(&module_path);
        let mut packages = self.discover_packages(dir, &name, &base_import_path)?;

        for pkg in packages.values_mut() {
            pkg.index();
        }

        // Hoist the definitions of types exported by alias into each package,
        // e.g. `type TokenCredential = shared.TokenCredential` in azcore gets
        // the fields of azcore/internal/shared.TokenCredential.
        let mut external = ExternalPackages::new();
        let resolution_events = AliasResolver::new(&name, &*self.parser)
            .with_workspace(workspace.as_ref())
            .resolve_all(&mut packages, &mut external);

        tracing::debug!(
            module = %name,
            packages = packages.len(),
            aliases = resolution_events.len(),
            external = external.len(),
            "module indexed"
        );

        Ok(Module {
            name,
            module_path,
            packages,
            resolution_events,
            external_packages: external.len(),
        })
    }

    fn discover_packages(
        &self,
        dir: &Path,
        module_name: &str,
        base_import_path: &str,
    ) -> Result<BTreeMap<String, Pkg>> {
        let mut packages = BTreeMap::new();
        let skip_testdata = !self.config.index_testdata;
        let prune = move |path: &Path| skip_testdata && is_testdata(dir, path);

        for candidate in self.directories.directories(dir, &prune) {
            let candidate = candidate?;
            let Ok(relative) = candidate.strip_prefix(dir) else {
                tracing::debug!(dir = %candidate.display(), "outside module root");
                continue;
            };
            let name = package_name(module_name, relative);

            let pkg = match self.parser.parse_package(&candidate, &name) {
                Ok(pkg) => pkg,
                Err(err) if err.is_no_packages() => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to index {}", candidate.display()));
                }
            };

            let import_path = format!("{}{}", base_import_path, pkg.name());
            match packages.entry(import_path) {
                Entry::Vacant(slot) => {
                    tracing::debug!(import_path = %slot.key(), "found package");
                    slot.insert(pkg);
                }
                Entry::Occupied(existing) => bail!(
                    "{} and {} both map to package {}",
                    existing.get().dir().display(),
                    candidate.display(),
                    existing.key()
                ),
            }
        }

        Ok(packages)
    }
}

impl Default for ModuleIndexer {
    fn default() -> Self {
        Self::new()
    }
}

fn module_name(dir: &Path) -> Result<String> {
    if let Some(name) = dir.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    let canonical = dir
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", dir.display()))?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} has no directory name", dir.display()))
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    Ok(cwd.join(dir))
}
