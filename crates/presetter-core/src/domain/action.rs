//! Actions: the declared steps of a preset.
//!
//! An [`Action`] pairs a kind-specific [`ActionPayload`] with the shared
//! gating data (conditions and title). Every field that may depend on run
//! state is a [`ContextValue`]; [`Action::resolve`] turns the whole action
//! into a concrete [`RawAction`] record right before a handler consumes it.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::{ContextValue, DomainError, Preset};

// ── Kinds ─────────────────────────────────────────────────────────────────────

/// Discriminator fixing which handler an action is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Apply another preset to the same target.
    Preset,
    /// Copy entries from the template directory.
    Extract,
    /// Run shell commands.
    Execute,
    /// Install or update dependencies of an ecosystem.
    Dependencies,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preset => "preset",
            Self::Extract => "extract",
            Self::Execute => "execute",
            Self::Dependencies => "dependencies",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preset" | "apply" => Ok(Self::Preset),
            "extract" => Ok(Self::Extract),
            "execute" | "run" => Ok(Self::Execute),
            "dependencies" | "install-dependencies" => Ok(Self::Dependencies),
            other => Err(DomainError::InvalidAction(format!(
                "unknown action type '{other}'"
            ))),
        }
    }
}

/// What extraction does when a destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Last writer wins.
    #[default]
    Override,
    /// Keep the existing file.
    Skip,
}

/// Package ecosystems dependencies can be installed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    #[default]
    Node,
    Php,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Php => f.write_str("php"),
        }
    }
}

impl FromStr for Ecosystem {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "node" | "npm" | "js" => Ok(Self::Node),
            "php" | "composer" => Ok(Self::Php),
            other => Err(DomainError::UnknownEcosystem(other.to_owned())),
        }
    }
}

/// Whether dependencies are installed from the lock file or updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    #[default]
    Install,
    Update,
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Apply another preset to the current target directory.
#[derive(Debug, Clone, Default)]
pub struct ApplyPreset {
    pub preset: ContextValue<String>,
    pub arguments: ContextValue<Vec<String>>,
    pub inherit: bool,
}

/// Copy files or directories from the template directory to the target.
#[derive(Debug, Clone)]
pub struct Extract {
    pub inputs: ContextValue<Vec<String>>,
    pub target: ContextValue<String>,
    pub conflict: ConflictStrategy,
    pub dotfiles: bool,
}

impl Default for Extract {
    fn default() -> Self {
        Self {
            inputs: ContextValue::Literal(vec![String::new()]),
            target: ContextValue::Literal(String::new()),
            conflict: ConflictStrategy::Override,
            dotfiles: true,
        }
    }
}

/// Run one or more commands, each with the same arguments.
#[derive(Debug, Clone, Default)]
pub struct Execute {
    pub commands: ContextValue<Vec<String>>,
    pub arguments: ContextValue<Vec<String>>,
}

/// Install dependencies for an ecosystem.
#[derive(Debug, Clone, Default)]
pub struct InstallDependencies {
    pub ecosystem: ContextValue<Ecosystem>,
    pub mode: InstallMode,
}

/// Kind-specific data of an [`Action`].
#[derive(Debug, Clone)]
pub enum ActionPayload {
    ApplyPreset(ApplyPreset),
    Extract(Extract),
    Execute(Execute),
    InstallDependencies(InstallDependencies),
}

impl ActionPayload {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::ApplyPreset(_) => ActionKind::Preset,
            Self::Extract(_) => ActionKind::Extract,
            Self::Execute(_) => ActionKind::Execute,
            Self::InstallDependencies(_) => ActionKind::Dependencies,
        }
    }

    fn resolve_fields(&self, preset: &Preset) -> Map<String, Value> {
        let value = match self {
            Self::ApplyPreset(a) => json!({
                "preset": a.preset.resolve(preset),
                "arguments": a.arguments.resolve(preset),
                "inherit": a.inherit,
            }),
            Self::Extract(e) => json!({
                "inputs": e.inputs.resolve(preset),
                "target": e.target.resolve(preset),
                "conflict": e.conflict,
                "dotfiles": e.dotfiles,
            }),
            Self::Execute(e) => json!({
                "commands": e.commands.resolve(preset),
                "arguments": e.arguments.resolve(preset),
            }),
            Self::InstallDependencies(d) => json!({
                "ecosystem": d.ecosystem.resolve(preset),
                "mode": d.mode,
            }),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

/// One declared step of a preset.
#[derive(Debug, Clone)]
pub struct Action {
    payload: ActionPayload,
    conditions: Vec<ContextValue<bool>>,
    title: Option<ContextValue<String>>,
}

impl Action {
    pub fn new(payload: impl Into<ActionPayload>) -> Self {
        Self {
            payload: payload.into(),
            conditions: Vec::new(),
            title: None,
        }
    }

    pub const fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    pub fn conditions(&self) -> &[ContextValue<bool>] {
        &self.conditions
    }

    pub fn title(&self) -> Option<&ContextValue<String>> {
        self.title.as_ref()
    }

    /// Append a condition; all conditions must hold at execution time.
    pub fn when(mut self, condition: impl Into<ContextValue<bool>>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<ContextValue<String>>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Put inherited group data in front of the action's own.
    pub(crate) fn inherit(&mut self, conditions: &[ContextValue<bool>], title: Option<&ContextValue<String>>) {
        if !conditions.is_empty() {
            let own = std::mem::take(&mut self.conditions);
            self.conditions = conditions.iter().cloned().chain(own).collect();
        }
        if self.title.is_none() {
            self.title = title.cloned();
        }
    }

    /// `true` when every condition resolves to `true` for `preset`.
    ///
    /// Stops at the first `false`; later conditions are not evaluated.
    pub fn conditions_hold(&self, preset: &Preset) -> bool {
        self.conditions.iter().all(|c| c.resolve(preset))
    }

    pub fn resolve_title(&self, preset: &Preset) -> Option<String> {
        self.title.as_ref().map(|t| t.resolve(preset))
    }

    /// Resolve every deferred field into a concrete record.
    pub fn resolve(&self, preset: &Preset) -> RawAction {
        RawAction {
            kind: self.kind(),
            fields: self.payload.resolve_fields(preset),
        }
    }
}

impl From<ApplyPreset> for ActionPayload {
    fn from(value: ApplyPreset) -> Self {
        Self::ApplyPreset(value)
    }
}

impl From<Extract> for ActionPayload {
    fn from(value: Extract) -> Self {
        Self::Extract(value)
    }
}

impl From<Execute> for ActionPayload {
    fn from(value: Execute) -> Self {
        Self::Execute(value)
    }
}

impl From<InstallDependencies> for ActionPayload {
    fn from(value: InstallDependencies) -> Self {
        Self::InstallDependencies(value)
    }
}

// ── Raw record ────────────────────────────────────────────────────────────────

/// Loosely-shaped action record consumed by handler validation.
///
/// Serialized form: `{"type": "preset", "preset": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    /// Deserialize the fields into a handler's record type.
    ///
    /// Returns `None` when the fields do not fit the shape.
    pub fn fields_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).ok()
    }
}

/// A string or a list of strings, as accepted at the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

// ── Chaining handle ───────────────────────────────────────────────────────────

/// Payload types reachable through an [`ActionRef`].
pub trait PayloadAccess {
    fn payload_mut(payload: &mut ActionPayload) -> Option<&mut Self>;
}

impl PayloadAccess for ApplyPreset {
    fn payload_mut(payload: &mut ActionPayload) -> Option<&mut Self> {
        match payload {
            ActionPayload::ApplyPreset(p) => Some(p),
            _ => None,
        }
    }
}

impl PayloadAccess for Extract {
    fn payload_mut(payload: &mut ActionPayload) -> Option<&mut Self> {
        match payload {
            ActionPayload::Extract(p) => Some(p),
            _ => None,
        }
    }
}

impl PayloadAccess for Execute {
    fn payload_mut(payload: &mut ActionPayload) -> Option<&mut Self> {
        match payload {
            ActionPayload::Execute(p) => Some(p),
            _ => None,
        }
    }
}

impl PayloadAccess for InstallDependencies {
    fn payload_mut(payload: &mut ActionPayload) -> Option<&mut Self> {
        match payload {
            ActionPayload::InstallDependencies(p) => Some(p),
            _ => None,
        }
    }
}

/// Typed handle on an action that was just added to a preset.
///
/// Returned by the [`Preset`] builder methods so declarations can chain.
pub struct ActionRef<'a, P> {
    action: &'a mut Action,
    _payload: PhantomData<P>,
}

impl<'a, P: PayloadAccess> ActionRef<'a, P> {
    pub(crate) fn new(action: &'a mut Action) -> Self {
        Self {
            action,
            _payload: PhantomData,
        }
    }

    /// Append a condition after any inherited ones.
    pub fn when(self, condition: impl Into<ContextValue<bool>>) -> Self {
        self.action.conditions.push(condition.into());
        self
    }

    pub fn with_title(self, title: impl Into<ContextValue<String>>) -> Self {
        self.action.title = Some(title.into());
        self
    }

    pub fn action(&self) -> &Action {
        &*self.action
    }

    fn update(self, f: impl FnOnce(&mut P)) -> Self {
        if let Some(payload) = P::payload_mut(&mut self.action.payload) {
            f(payload);
        }
        self
    }
}

impl ActionRef<'_, ApplyPreset> {
    pub fn with_arguments(self, arguments: impl Into<ContextValue<Vec<String>>>) -> Self {
        let arguments = arguments.into();
        self.update(|p| p.arguments = arguments)
    }

    /// Forward the parent's argv after this action's own arguments.
    pub fn inherit_arguments(self, inherit: bool) -> Self {
        self.update(|p| p.inherit = inherit)
    }
}

impl ActionRef<'_, Extract> {
    /// Destination sub-directory, relative to the target directory.
    pub fn to(self, target: impl Into<ContextValue<String>>) -> Self {
        let target = target.into();
        self.update(|p| p.target = target)
    }

    pub fn when_conflict(self, strategy: ConflictStrategy) -> Self {
        self.update(|p| p.conflict = strategy)
    }

    /// Keep `*.dotfile` names as they are instead of renaming them to `.*`.
    pub fn without_dots(self) -> Self {
        self.update(|p| p.dotfiles = false)
    }
}

impl ActionRef<'_, Execute> {
    pub fn with_arguments(self, arguments: impl Into<ContextValue<Vec<String>>>) -> Self {
        let arguments = arguments.into();
        self.update(|p| p.arguments = arguments)
    }
}

impl ActionRef<'_, InstallDependencies> {
    pub fn for_ecosystem(self, ecosystem: impl Into<ContextValue<Ecosystem>>) -> Self {
        let ecosystem = ecosystem.into();
        self.update(|p| p.ecosystem = ecosystem)
    }
}

impl From<Ecosystem> for ContextValue<Ecosystem> {
    fn from(value: Ecosystem) -> Self {
        Self::Literal(value)
    }
}
