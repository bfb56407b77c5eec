use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates candidate package directories below a root, the root included.
/// Directories for which `prune` returns true are left out with their subtrees.
///
/// Every call starts a fresh, finite walk.
pub trait DirectorySource {
    fn directories<'a>(
        &'a self,
        root: &'a Path,
        prune: &'a dyn Fn(&Path) -> bool,
    ) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a>;
}

/// Never prunes anything.
pub fn keep_all(_: &Path) -> bool {
    false
}

/// Filesystem walk in file-name order, so repeated runs see the same sequence.
pub struct WalkDirSource;

impl WalkDirSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WalkDirSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectorySource for WalkDirSource {
    fn directories<'a>(
        &'a self,
        root: &'a Path,
        prune: &'a dyn Fn(&Path) -> bool,
    ) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a> {
        let walk = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !(entry.file_type().is_dir() && prune(entry.path())))
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(err) => Some(Err(anyhow::Error::new(err))),
            });
        Box::new(walk)
    }
}

/// Fixed directory listing, for driving the indexer without a filesystem.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectories {
    directories: Vec<PathBuf>,
}

impl StaticDirectories {
    pub fn new<I, P>(directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            directories: directories.into_iter().map(Into::into).collect(),
        }
    }
}

impl DirectorySource for StaticDirectories {
    fn directories<'a>(
        &'a self,
        root: &'a Path,
        prune: &'a dyn Fn(&Path) -> bool,
    ) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a> {
        Box::new(
            self.directories
                .iter()
                .filter(move |dir| dir.starts_with(root))
                .filter(move |dir| {
                    !dir.ancestors()
                        .take_while(|ancestor| ancestor.starts_with(root))
                        .any(|ancestor| prune(ancestor))
                })
                .cloned()
                .map(Ok),
        )
    }
}

/// Whether `path` is a test fixture directory of the module at `root`, or
/// lies below one. Only the part of `path` below `root` is looked at.
pub fn is_testdata(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .contains("testdata")
}
