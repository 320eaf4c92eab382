//! Application layer for Presetter.
//!
//! This layer contains:
//! - **Services**: the [`Applier`], which orchestrates a run
//! - **Handlers**: one [`ActionHandler`] per action kind, in a [`HandlerRegistry`]
//! - **Ports**: interface definitions (traits) for external dependencies
//! - **Errors**: application-specific error types
//!
//! Side effects only ever happen behind a port; the handlers decide which
//! port to call and with what.

pub mod error;
pub mod handlers;
pub mod ports;
pub mod services;

pub use services::{
    ActionOutcome, ActionRecord, Applier, ApplierOptions, ApplierSettings, DEFAULT_MAX_DEPTH,
    RunReport,
};

pub use handlers::{ActionHandler, Handled, HandlerRegistry, PresetRunner, RunContext, ValidatedAction};

// Re-export port traits (for adapter implementation)
pub use ports::{
    DependencyInstaller, ExtractRequest, Filesystem, GitOperations, LoadedPreset, PresetLoader,
    PresetScript, ShellExecutor, TemplateExtractor,
};

pub use error::ApplicationError;
