use serde::Serialize;

/// Prefix of every alias diagnostic's text
pub const ALIAS_FOR: &str = "alias for ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    /// The aliased type is defined outside the current module
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub target_id: String,
    pub text: String,
}

impl Diagnostic {
    pub fn new(
        level: DiagnosticLevel,
        target_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            level,
            target_id: target_id.into(),
            text: text.into(),
        }
    }

    pub fn alias_for(level: DiagnosticLevel, target_id: impl Into<String>, name: &str) -> Self {
        Self::new(level, target_id, format!("{}{}", ALIAS_FOR, name))
    }
}
