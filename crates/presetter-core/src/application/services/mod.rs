//! Application services - orchestrate use cases.
//!
//! The [`Applier`] is the single use case: apply a preset (and, through
//! nested `preset` actions, the presets it composes) to a target directory.

pub mod applier;

pub use applier::{
    ActionOutcome, ActionRecord, Applier, ApplierOptions, ApplierSettings, DEFAULT_MAX_DEPTH,
    RunReport,
};
