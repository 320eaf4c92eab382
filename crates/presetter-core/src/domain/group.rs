//! Grouping scopes.
//!
//! While a [`PendingGroup`] is committing, every action added to the preset
//! inherits the group's conditions and title. Scopes live on an explicit
//! stack owned by the [`Preset`]; the scope is popped by a guard, so it is
//! released when the callback returns, fails, or panics.

use std::ops::Range;

use crate::domain::{ContextValue, Preset};
use crate::error::PresetResult;

/// Conditions and title shared by every action added inside a group.
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupScope {
    pub(crate) conditions: Vec<ContextValue<bool>>,
    pub(crate) title: Option<ContextValue<String>>,
}

/// A group being configured, not yet committed.
#[must_use = "a group does nothing until `commit` is called"]
pub struct PendingGroup<'p> {
    preset: &'p mut Preset,
    scope: GroupScope,
}

impl<'p> PendingGroup<'p> {
    pub(crate) fn new(preset: &'p mut Preset) -> Self {
        Self {
            preset,
            scope: GroupScope::default(),
        }
    }

    /// Add a condition inherited by every action of the group.
    pub fn when(mut self, condition: impl Into<ContextValue<bool>>) -> Self {
        self.scope.conditions.push(condition.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<ContextValue<String>>) -> Self {
        self.scope.title = Some(title.into());
        self
    }

    /// Open the scope, run `callback`, then close the scope.
    ///
    /// An error from the callback is returned after the scope is closed.
    pub fn commit<F>(self, callback: F) -> PresetResult<CommittedGroup>
    where
        F: FnOnce(&mut Preset) -> PresetResult<()>,
    {
        let Self { preset, scope } = self;
        let start = preset.actions().len();

        preset.open_scope(scope);
        let result = {
            let mut guard = scopeguard::guard(&mut *preset, |p| p.close_scope());
            callback(&mut **guard)
        };
        result?;

        Ok(CommittedGroup {
            actions: start..preset.actions().len(),
        })
    }
}

/// Result of a committed group: which actions it added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedGroup {
    actions: Range<usize>,
}

impl CommittedGroup {
    /// Indices of the actions added by the group, in declaration order.
    pub fn actions(&self) -> Range<usize> {
        self.actions.clone()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
