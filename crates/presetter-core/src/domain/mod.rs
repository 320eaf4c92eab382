// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Presetter.
//!
//! The preset model: what a preset author declares and the values those
//! declarations carry. Nothing in here performs I/O; side effects happen in
//! the application layer through ports.
//!
//! - [`ContextValue`]: literal or deferred value
//! - [`Action`]: one declared step, gated by conditions
//! - [`PendingGroup`]: scope whose conditions/title are inherited
//! - [`Preset`]: ordered actions plus run-scoped state
pub mod action;
pub mod context_value;
pub mod error;
pub mod group;
pub mod options;
pub mod preset;

// Re-exports for convenience
pub use action::{
    Action, ActionKind, ActionPayload, ActionRef, ApplyPreset, ConflictStrategy, Ecosystem,
    Execute, Extract, InstallDependencies, InstallMode, OneOrMany, PayloadAccess, RawAction,
};
pub use context_value::{ContextValue, Deferred};
pub use error::{DomainError, ErrorCategory};
pub use group::{CommittedGroup, PendingGroup};
pub use options::{CommandLineOptions, GitContext, truthy};
pub use preset::{DEFAULT_TEMPLATE_DIRECTORY, Instructions, Preset, RunBinding};
