//! Git metadata through the `git` executable.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use presetter_core::{
    application::{
        ApplicationError,
        ports::{GitOperations, ShellExecutor},
    },
    error::PresetResult,
};
use tracing::instrument;

/// [`GitOperations`] backed by the `git` command line.
#[derive(Clone)]
pub struct GitCli {
    shell: Arc<dyn ShellExecutor>,
    /// Directory `git config --list` runs in, so repository-local settings apply.
    cwd: std::path::PathBuf,
}

impl GitCli {
    pub fn new(shell: Arc<dyn ShellExecutor>, cwd: impl Into<std::path::PathBuf>) -> Self {
        Self {
            shell,
            cwd: cwd.into(),
        }
    }
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli").field("cwd", &self.cwd).finish()
    }
}

/// Parse `key=value` lines; later entries win, like git itself.
pub(crate) fn parse_config(lines: &[String]) -> BTreeMap<String, String> {
    lines
        .iter()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
        .collect()
}

impl GitOperations for GitCli {
    #[instrument(skip(self))]
    fn config_snapshot(&self) -> PresetResult<BTreeMap<String, String>> {
        let lines = self
            .run(&["config".into(), "--list".into()], &self.cwd)
            .map_err(|e| ApplicationError::GitError {
                reason: e.to_string(),
            })?;
        Ok(parse_config(&lines))
    }

    fn run(&self, args: &[String], cwd: &Path) -> PresetResult<Vec<String>> {
        self.shell.execute("git", args, cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeGit;

    impl ShellExecutor for FakeGit {
        fn execute(&self, command: &str, args: &[String], _: &Path) -> PresetResult<Vec<String>> {
            assert_eq!(command, "git");
            assert_eq!(args, ["config", "--list"]);
            Ok(vec![
                "user.name=Global".into(),
                "core.editor=vim".into(),
                "user.name=Ada Lovelace".into(),
                "not a pair".into(),
            ])
        }
    }

    #[test]
    fn snapshot_keeps_last_value() {
        let git = GitCli::new(Arc::new(FakeGit), "/work/app");
        let config = git.config_snapshot().unwrap();

        assert_eq!(config.get("user.name").map(String::as_str), Some("Ada Lovelace"));
        assert_eq!(config.get("core.editor").map(String::as_str), Some("vim"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn value_may_contain_equals() {
        let parsed = parse_config(&["alias.lg=log --format=%h".to_string()]);
        assert_eq!(parsed["alias.lg"], "log --format=%h");
    }
}
