//! The `Preset` aggregate and its declarative builder API.
//!
//! A preset script receives a fresh `Preset` with its run state already
//! bound (target, options, args, git) and declares actions through the
//! builder methods. Declaration order is execution order.

use std::collections::BTreeMap;
use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    Action, ActionRef, ApplyPreset, CommandLineOptions, ContextValue, DomainError, Ecosystem,
    Execute, Extract, GitContext, InstallDependencies, InstallMode, PayloadAccess,
    group::{CommittedGroup, GroupScope, PendingGroup},
};
use crate::error::PresetResult;

pub const DEFAULT_TEMPLATE_DIRECTORY: &str = "templates";

/// Text shown to the user after the preset has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructions {
    pub heading: Option<String>,
    pub messages: Vec<String>,
}

impl Instructions {
    pub fn with_heading(&mut self, heading: impl Into<String>) -> &mut Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn to<I, S>(&mut self, messages: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
        self
    }
}

/// Run state bound onto a preset before its script executes.
#[derive(Debug, Clone, Default)]
pub struct RunBinding {
    pub target_directory: PathBuf,
    pub preset_directory: PathBuf,
    pub options: CommandLineOptions,
    pub args: Vec<String>,
    pub git: GitContext,
}

/// A composable scaffolding script: ordered actions plus run-scoped state.
#[derive(Debug, Clone)]
pub struct Preset {
    name: Option<String>,
    template_directory: String,
    preset_directory: PathBuf,
    target_directory: PathBuf,
    actions: Vec<Action>,
    instructions: Option<Instructions>,
    prompts: BTreeMap<String, Value>,
    git: GitContext,
    options: CommandLineOptions,
    args: Vec<String>,
    scopes: Vec<GroupScope>,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: None,
            template_directory: DEFAULT_TEMPLATE_DIRECTORY.to_owned(),
            preset_directory: PathBuf::new(),
            target_directory: PathBuf::new(),
            actions: Vec::new(),
            instructions: None,
            prompts: BTreeMap::new(),
            git: GitContext::default(),
            options: CommandLineOptions::default(),
            args: Vec::new(),
            scopes: Vec::new(),
        }
    }
}

impl Preset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preset with its run state bound.
    pub fn bound(binding: RunBinding) -> Self {
        Self {
            target_directory: binding.target_directory,
            preset_directory: binding.preset_directory,
            options: binding.options,
            args: binding.args,
            git: binding.git,
            ..Self::default()
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn template_directory(&self) -> &str {
        &self.template_directory
    }

    pub fn preset_directory(&self) -> &Path {
        &self.preset_directory
    }

    pub fn target_directory(&self) -> &Path {
        &self.target_directory
    }

    /// Absolute location extraction reads from.
    pub fn template_root(&self) -> PathBuf {
        self.preset_directory.join(&self.template_directory)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn instructions(&self) -> Option<&Instructions> {
        self.instructions.as_ref()
    }

    pub fn options(&self) -> &CommandLineOptions {
        &self.options
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn git(&self) -> &GitContext {
        &self.git
    }

    pub fn prompts(&self) -> &BTreeMap<String, Value> {
        &self.prompts
    }

    pub fn prompt(&self, key: &str) -> Option<&Value> {
        self.prompts.get(key)
    }

    pub fn prompt_str(&self, key: &str) -> Option<&str> {
        self.prompts.get(key).and_then(Value::as_str)
    }

    /// Record the answer to a prompt. Each key can be answered once.
    pub fn answer(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), DomainError> {
        let key = key.into();
        if self.prompts.contains_key(&key) {
            return Err(DomainError::PromptAlreadyAnswered { key });
        }
        self.prompts.insert(key, value.into());
        Ok(())
    }

    /// `true` when attached to a terminal and interaction was not disabled.
    ///
    /// Prompting collaborators must check this before asking anything.
    pub fn is_interactive(&self) -> bool {
        std::io::stdout().is_terminal() && self.options.interaction != Some(false)
    }

    // ── Builder API ───────────────────────────────────────────────────────

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_template_directory(&mut self, directory: impl Into<String>) -> &mut Self {
        self.template_directory = directory.into();
        self
    }

    /// Register a default for an option; explicit run options win.
    pub fn option(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if !self.options.contains(key) {
            self.options.set(key, value.into());
        }
        self
    }

    /// Add instructions to display once the preset has been applied.
    pub fn instruct<I, S>(&mut self, messages: I) -> &mut Instructions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut instructions = Instructions::default();
        instructions.to(messages);
        self.instructions.insert(instructions)
    }

    /// Append `action`, applying the conditions and title of open groups.
    pub fn add_action(&mut self, mut action: Action) -> &mut Action {
        if !self.scopes.is_empty() {
            let conditions: Vec<ContextValue<bool>> = self
                .scopes
                .iter()
                .flat_map(|s| s.conditions.iter().cloned())
                .collect();
            let title = self.scopes.iter().rev().find_map(|s| s.title.as_ref());
            action.inherit(&conditions, title);
        }

        let index = self.actions.len();
        self.actions.push(action);
        &mut self.actions[index]
    }

    fn push<P: PayloadAccess + Into<crate::domain::ActionPayload>>(&mut self, payload: P) -> ActionRef<'_, P> {
        ActionRef::new(self.add_action(Action::new(payload)))
    }

    /// Apply another preset to the same target directory.
    ///
    /// ```rust
    /// # use presetter_core::domain::Preset;
    /// let mut preset = Preset::new();
    /// preset.apply("laravel:tailwindcss").inherit_arguments(true);
    /// ```
    pub fn apply(&mut self, resolvable: impl Into<ContextValue<String>>) -> ActionRef<'_, ApplyPreset> {
        self.push(ApplyPreset {
            preset: resolvable.into(),
            ..ApplyPreset::default()
        })
    }

    /// Copy files or directories from the template directory to the target.
    ///
    /// `"auth"` copies a directory, `"*.php"` matches files at the template
    /// root, and `"gitignore.dotfile"` lands as `.gitignore`. An empty input
    /// copies the whole template directory.
    pub fn extract(&mut self, inputs: impl Into<ContextValue<Vec<String>>>) -> ActionRef<'_, Extract> {
        self.push(Extract {
            inputs: inputs.into(),
            ..Extract::default()
        })
    }

    /// Run shell commands; chain `with_arguments` to pass arguments.
    pub fn execute(&mut self, commands: impl Into<ContextValue<Vec<String>>>) -> ActionRef<'_, Execute> {
        self.push(Execute {
            commands: commands.into(),
            ..Execute::default()
        })
    }

    /// Install dependencies, Node by default.
    pub fn install_dependencies(&mut self) -> ActionRef<'_, InstallDependencies> {
        self.push(InstallDependencies {
            ecosystem: Ecosystem::Node.into(),
            mode: InstallMode::Install,
        })
    }

    /// Same as [`Preset::install_dependencies`], updating instead.
    pub fn update_dependencies(&mut self) -> ActionRef<'_, InstallDependencies> {
        self.push(InstallDependencies {
            ecosystem: Ecosystem::Node.into(),
            mode: InstallMode::Update,
        })
    }

    /// Start a group; configure it, then `commit` a callback.
    pub fn pending_group(&mut self) -> PendingGroup<'_> {
        PendingGroup::new(self)
    }

    /// Group the actions added by `callback`.
    pub fn group<F>(&mut self, callback: F) -> PresetResult<CommittedGroup>
    where
        F: FnOnce(&mut Preset) -> PresetResult<()>,
    {
        self.pending_group().commit(callback)
    }

    pub(crate) fn open_scope(&mut self, scope: GroupScope) {
        self.scopes.push(scope);
    }

    pub(crate) fn close_scope(&mut self) {
        self.scopes.pop();
    }
}
