// ============================================================================
// domain/error.rs - PRESET MODEL ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Raised while a preset script builds its action list, before anything
/// touches the target directory.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Preset reference cannot be empty")]
    EmptyResolvable,

    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Unknown ecosystem '{0}'")]
    UnknownEcosystem(String),

    // ========================================================================
    // State Violations
    // ========================================================================
    #[error("Prompt '{key}' has already been answered")]
    PromptAlreadyAnswered { key: String },

    #[error("Preset script failed: {0}")]
    ScriptFailed(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidAction(msg) => vec![
                "Check the action declarations of the preset".into(),
                format!("Details: {}", msg),
            ],
            Self::EmptyResolvable => vec![
                "Pass a preset name, a git repository, or a local path".into(),
            ],
            Self::UnknownEcosystem(name) => vec![
                format!("'{}' is not a supported ecosystem", name),
                "Supported ecosystems: node, php".into(),
            ],
            Self::PromptAlreadyAnswered { key } => vec![
                format!("The answer to '{}' is recorded once per run", key),
                "Use a different prompt key".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAction(_)
            | Self::EmptyResolvable
            | Self::InvalidOption { .. }
            | Self::UnknownEcosystem(_) => ErrorCategory::Validation,
            Self::PromptAlreadyAnswered { .. } | Self::ScriptFailed(_) => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Internal,
}
