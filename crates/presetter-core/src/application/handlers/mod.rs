//! Action handlers and their registry.
//!
//! Each handler owns one [`ActionKind`]. Dispatch is two-phase:
//! [`ActionHandler::validate`] turns the loosely shaped [`RawAction`] into a
//! [`ValidatedAction`] (or rejects it, in which case the action is skipped),
//! then [`ActionHandler::handle`] performs the side effect.

mod dependencies;
mod execute;
mod extract;
mod preset;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{DependencyInstaller, ShellExecutor, TemplateExtractor};
use crate::application::services::{ApplierOptions, RunReport};
use crate::domain::{ActionKind, CommandLineOptions, ConflictStrategy, Ecosystem, InstallMode, RawAction};
use crate::error::{PresetError, PresetResult};

pub use dependencies::DependenciesActionHandler;
pub use execute::ExecuteActionHandler;
pub use extract::ExtractActionHandler;
pub use preset::PresetActionHandler;

/// State passed from the applier to a handler for one action.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Absolute path of the directory being scaffolded.
    pub target_directory: PathBuf,
    /// Arguments visible to the executing action.
    pub argv: Vec<String>,
    /// Where the running preset's templates live.
    pub template_root: PathBuf,
    /// Options of the running preset, as supplied by its caller.
    pub options: CommandLineOptions,
    /// Nesting depth of the running preset; the top-level run is 0.
    pub depth: usize,
}

/// What a handler produced for one action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Handled {
    /// `false` reports a contained failure.
    pub success: bool,
    /// Captured command output, in the order it was produced.
    pub output: Vec<String>,
    /// Report of the preset applied by a `preset` action.
    pub nested: Option<Box<RunReport>>,
}

impl Handled {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.output.extend(lines);
        self
    }

    pub fn with_nested(mut self, report: RunReport) -> Self {
        self.nested = Some(Box::new(report));
        self
    }
}

/// Re-entry point used by the sub-preset handler.
#[cfg_attr(test, mockall::automock)]
pub trait PresetRunner {
    fn run(&self, options: ApplierOptions) -> PresetResult<RunReport>;
}

// ── Validated actions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetAction {
    pub preset: String,
    pub arguments: Vec<String>,
    pub inherit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractAction {
    pub inputs: Vec<String>,
    pub target: String,
    pub conflict: ConflictStrategy,
    pub dotfiles: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteAction {
    pub commands: Vec<String>,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependenciesAction {
    pub ecosystem: Ecosystem,
    pub mode: InstallMode,
}

/// A fully shaped action, ready to be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    Preset(PresetAction),
    Extract(ExtractAction),
    Execute(ExecuteAction),
    Dependencies(DependenciesAction),
}

impl ValidatedAction {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Preset(_) => ActionKind::Preset,
            Self::Extract(_) => ActionKind::Extract,
            Self::Execute(_) => ActionKind::Execute,
            Self::Dependencies(_) => ActionKind::Dependencies,
        }
    }
}

/// Error for a handler receiving an action of another kind.
fn mismatched(expected: ActionKind, action: &ValidatedAction) -> PresetError {
    PresetError::Internal {
        message: format!(
            "{} handler received a '{}' action",
            expected,
            action.kind()
        ),
    }
}

// ── Handler trait ─────────────────────────────────────────────────────────────

/// Validates and performs one kind of action.
pub trait ActionHandler: Send + Sync {
    fn kind(&self) -> ActionKind;

    /// Normalize a raw record; `None` means the action is invalid.
    fn validate(&self, raw: RawAction) -> Option<ValidatedAction>;

    /// Perform the side effect. An unsuccessful [`Handled`] reports a
    /// contained failure; `Err` stops the run.
    fn handle(
        &self,
        action: ValidatedAction,
        context: &RunContext,
        runner: &dyn PresetRunner,
    ) -> PresetResult<Handled>;
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Mapping from action kind to its handler, built once at startup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Box<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every built-in action kind.
    pub fn standard(
        shell: Arc<dyn ShellExecutor>,
        extractor: Arc<dyn TemplateExtractor>,
        installer: Arc<dyn DependencyInstaller>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(PresetActionHandler::new());
        registry.register(ExtractActionHandler::new(extractor));
        registry.register(ExecuteActionHandler::new(shell));
        registry.register(DependenciesActionHandler::new(installer));
        registry
    }

    /// Register `handler`, returning the one it replaces.
    pub fn register(&mut self, handler: impl ActionHandler + 'static) -> Option<Box<dyn ActionHandler>> {
        self.handlers.insert(handler.kind(), Box::new(handler))
    }

    pub fn get(&self, kind: ActionKind) -> Option<&dyn ActionHandler> {
        self.handlers.get(&kind).map(Box::as_ref)
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
