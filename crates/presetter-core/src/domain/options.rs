//! Run-scoped command-line options and git metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::ports::GitOperations;

/// Options supplied on the command line for one run.
///
/// The three well-known keys have typed fields; anything else lands in
/// `extra` and stays readable through [`CommandLineOptions::get`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandLineOptions {
    /// Sub-directory in which to look for the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Whether to use SSH when the preset comes from a remote repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<bool>,

    /// `Some(false)` disables every interactive prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CommandLineOptions {
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "path" => self.path.clone().map(Value::String),
            "ssh" => self.ssh.map(Value::Bool),
            "interaction" => self.interaction.map(Value::Bool),
            other => self.extra.get(other).cloned(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, routing well-known keys to their typed fields.
    ///
    /// A value of the wrong type for a typed field clears that field.
    pub fn set(&mut self, key: &str, value: Value) {
        match key {
            "path" => self.path = value.as_str().map(str::to_owned),
            "ssh" => self.ssh = value.as_bool(),
            "interaction" => self.interaction = value.as_bool(),
            other => {
                self.extra.insert(other.to_owned(), value);
            }
        }
    }

    /// Truthiness of an option, as used by manifest conditions.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| truthy(&v))
    }
}

/// JavaScript-like truthiness for loosely typed values.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Git metadata available to a preset during a run.
#[derive(Clone, Default)]
pub struct GitContext {
    /// Snapshot of `git config`, keyed like `user.name`.
    pub config: BTreeMap<String, String>,
    /// Handle for further git operations, when git is available.
    pub operations: Option<Arc<dyn GitOperations>>,
}

impl GitContext {
    pub fn new(config: BTreeMap<String, String>, operations: Option<Arc<dyn GitOperations>>) -> Self {
        Self { config, operations }
    }

    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }
}

impl fmt::Debug for GitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitContext")
            .field("config", &self.config)
            .field("operations", &self.operations.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn well_known_keys_use_typed_fields() {
        let mut options = CommandLineOptions::default();
        options.set("interaction", json!(false));
        options.set("auth", json!("jetstream"));

        assert_eq!(options.interaction, Some(false));
        assert_eq!(options.get("interaction"), Some(json!(false)));
        assert_eq!(options.get("auth"), Some(json!("jetstream")));
        assert!(!options.contains("ssh"));
    }

    #[test]
    fn extra_options_flatten_in_serialized_form() {
        let options: CommandLineOptions =
            serde_json::from_value(json!({"ssh": true, "tailwind": 1})).unwrap();
        assert_eq!(options.ssh, Some(true));
        assert!(options.is_enabled("tailwind"));
    }

    #[test]
    fn truthiness_matches_loose_values() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!("false")));
        assert!(!truthy(&json!(0)));
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!([])));
    }
}
