pub mod diagnostic;
pub mod manifest;
pub mod module;
pub mod package;
pub mod resolver;
pub mod scanner;
pub mod token;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use module::{IndexerConfig, Module, ModuleIndexer};
pub use package::{Declaration, Field, Method, Pkg, SourceFile, TypeShape};
pub use resolver::{
    AliasResolver, ExternalPackages, PlaceholderReason, ResolutionEvent, ResolutionOutcome,
    WorkspaceRoot,
};
pub use scanner::{DirectorySource, StaticDirectories, WalkDirSource};
pub use token::{Content, Token, TokenKind};
