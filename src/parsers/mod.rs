pub mod common;
pub mod go;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::Pkg;

#[derive(Debug, Error)]
pub enum PackageError {
    /// The directory holds no indexable Go package. Callers skip it.
    #[error("no Go packages in {}", .0.display())]
    NoPackages(PathBuf),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl PackageError {
    pub fn is_no_packages(&self) -> bool {
        matches!(self, PackageError::NoPackages(_))
    }
}

/// Turns one directory into an unindexed declaration index.
pub trait PackageParser {
    /// `package_name` is the name the package is known by, e.g. `azcore/policy`.
    fn parse_package(&self, dir: &Path, package_name: &str) -> Result<Pkg, PackageError>;
}
