//! Application layer errors.
//!
//! These errors represent failures while applying a preset: resolution,
//! dispatch, and the side effects performed by handlers. Preset model errors
//! are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ActionKind;
use crate::error::ErrorCategory;

/// Errors that occur while applying a preset.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The loader could not turn a resolvable into a preset.
    #[error("Preset '{resolvable}' could not be resolved: {reason}")]
    PresetResolution { resolvable: String, reason: String },

    /// No handler is registered for an action kind.
    #[error("No handler registered for '{kind}' actions")]
    HandlerMissing { kind: ActionKind },

    /// Nested preset application went deeper than allowed.
    #[error("Preset '{resolvable}' exceeds the maximum nesting depth of {max_depth}")]
    RecursionLimit { resolvable: String, max_depth: usize },

    /// A shell command could not be spawned or exited unsuccessfully.
    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Dependency installation failed.
    #[error("Installing {ecosystem} dependencies failed: {reason}")]
    InstallFailed { ecosystem: String, reason: String },

    /// Git metadata could not be read.
    #[error("Git error: {reason}")]
    GitError { reason: String },

    /// Lock poisoned inside an adapter.
    #[error("Adapter state lock poisoned")]
    LockPoisoned,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PresetResolution { resolvable, reason } => vec![
                format!("Could not resolve '{}': {}", resolvable, reason),
                "Check that the path exists and contains a preset.toml".into(),
                "Or register an alias with: presetter config list".into(),
            ],
            Self::HandlerMissing { kind } => vec![
                format!("Actions of type '{}' cannot be applied by this build", kind),
                "This is likely a configuration error".into(),
            ],
            Self::RecursionLimit { resolvable, .. } => vec![
                format!("'{}' may apply itself through another preset", resolvable),
                "Check the preset chain for cycles".into(),
                "Or raise presets.max_depth in the configuration".into(),
            ],
            Self::CommandFailed { command, .. } => vec![
                format!("Ensure '{}' is installed and in your PATH", command),
                "Run with -vv to see the command output".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::InstallFailed { ecosystem, .. } => vec![
                format!("Ensure the {} package manager is installed", ecosystem),
                "Run with -vv to see the installer output".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PresetResolution { .. } => ErrorCategory::NotFound,
            Self::HandlerMissing { .. } => ErrorCategory::Configuration,
            Self::RecursionLimit { .. } => ErrorCategory::Validation,
            Self::CommandFailed { .. }
            | Self::FilesystemError { .. }
            | Self::InstallFailed { .. }
            | Self::GitError { .. }
            | Self::LockPoisoned => ErrorCategory::Internal,
        }
    }
}
