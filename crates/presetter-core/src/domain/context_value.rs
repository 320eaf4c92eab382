//! Values that are either known now or computed from the active preset.
//!
//! A [`ContextValue`] lets a preset author write `"templates"` and
//! `|p| p.prompt_str("dir")` in the same position. Deferred values are
//! resolved at the moment the engine consumes the owning field, against
//! the preset instance that owns the action, and are never cached.

use std::fmt;
use std::sync::Arc;

use crate::domain::Preset;

/// Function form of a [`ContextValue`].
pub type Deferred<T> = Arc<dyn Fn(&Preset) -> T + Send + Sync>;

/// A literal value or a function of the active [`Preset`].
pub enum ContextValue<T> {
    Literal(T),
    Deferred(Deferred<T>),
}

impl<T: Clone> ContextValue<T> {
    /// Wrap a function of the active preset.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&Preset) -> T + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(f))
    }

    /// Produce the concrete value for `preset`.
    ///
    /// The deferred form is invoked on every call.
    pub fn resolve(&self, preset: &Preset) -> T {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Deferred(compute) => compute(preset),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Transform the produced value, keeping the deferral.
    pub fn map<U, F>(self, f: F) -> ContextValue<U>
    where
        T: Send + Sync + 'static,
        U: Clone,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        match self {
            Self::Literal(value) => ContextValue::Literal(f(value)),
            Self::Deferred(compute) => ContextValue::Deferred(Arc::new(move |p| f(compute(p)))),
        }
    }
}

impl<T: Clone> Clone for ContextValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(value) => Self::Literal(value.clone()),
            Self::Deferred(compute) => Self::Deferred(Arc::clone(compute)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ContextValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl<T: Default> Default for ContextValue<T> {
    fn default() -> Self {
        Self::Literal(T::default())
    }
}

impl From<&str> for ContextValue<String> {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<String> for ContextValue<String> {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<bool> for ContextValue<bool> {
    fn from(value: bool) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for ContextValue<Vec<String>> {
    fn from(value: &str) -> Self {
        Self::Literal(vec![value.to_owned()])
    }
}

impl From<String> for ContextValue<Vec<String>> {
    fn from(value: String) -> Self {
        Self::Literal(vec![value])
    }
}

impl From<Vec<String>> for ContextValue<Vec<String>> {
    fn from(value: Vec<String>) -> Self {
        Self::Literal(value)
    }
}

impl From<&[&str]> for ContextValue<Vec<String>> {
    fn from(value: &[&str]) -> Self {
        Self::Literal(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ContextValue<Vec<String>> {
    fn from(value: [&str; N]) -> Self {
        Self::Literal(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<T, F> From<F> for ContextValue<T>
where
    T: Clone,
    F: Fn(&Preset) -> T + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::deferred(f)
    }
}
