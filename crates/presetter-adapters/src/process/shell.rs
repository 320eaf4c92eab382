//! Shell execution through `std::process::Command`.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, instrument};

use presetter_core::{
    application::{ApplicationError, ports::ShellExecutor},
    error::{PresetError, PresetResult},
};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("No command specified to run")]
    EmptyCommand,
    #[error("could not be started: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("exited with {status}{}", stderr_suffix(.stderr))]
    NonZeroExit { status: String, stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        text => format!(": {text}"),
    }
}

impl ProcessError {
    fn into_preset_error(self, command: &str) -> PresetError {
        ApplicationError::CommandFailed {
            command: command.to_owned(),
            reason: self.to_string(),
        }
        .into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs programs directly (no shell), capturing stdout and stderr together.
///
/// On Windows, built-ins such as `echo` are retried through `cmd /C`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandShellExecutor;

impl CommandShellExecutor {
    pub fn new() -> Self {
        Self
    }

    fn spawn(command: &str, args: &[String], cwd: &Path) -> Result<Child, ProcessError> {
        if command.trim().is_empty() {
            return Err(ProcessError::EmptyCommand);
        }

        let spawn = |program: &str, leading: &[&str]| {
            Command::new(program)
                .args(leading)
                .args(args)
                .current_dir(cwd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
        };

        match spawn(command, &[]) {
            Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
                debug!(%command, "Command not found. Retrying with cmd /C.");
                Ok(spawn("cmd", &["/C", command])?)
            }
            result => Ok(result?),
        }
    }

    /// Lines from both streams in arrival order.
    fn capture(mut child: Child) -> Result<Vec<String>, ProcessError> {
        let (tx, rx) = mpsc::channel();
        let readers = [
            child.stdout.take().map(|out| forward(out, Stream::Stdout, tx.clone())),
            child.stderr.take().map(|err| forward(err, Stream::Stderr, tx.clone())),
        ];
        drop(tx);

        let received: Vec<(Stream, String)> = rx.iter().collect();
        for reader in readers.into_iter().flatten() {
            let _ = reader.join();
        }
        let status = child.wait()?;

        if !status.success() {
            let stderr = received
                .iter()
                .filter(|(stream, _)| *stream == Stream::Stderr)
                .map(|(_, line)| line.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ProcessError::NonZeroExit {
                status: status.to_string(),
                stderr,
            });
        }

        Ok(received
            .into_iter()
            .map(|(_, line)| line.trim_end().to_owned())
            .filter(|line| !line.trim().is_empty())
            .collect())
    }
}

fn forward(
    source: impl Read + Send + 'static,
    stream: Stream,
    tx: Sender<(Stream, String)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(source).lines().map_while(Result::ok) {
            if tx.send((stream, line)).is_err() {
                break;
            }
        }
    })
}

impl ShellExecutor for CommandShellExecutor {
    #[instrument(skip(self, args), fields(cwd = %cwd.display()))]
    fn execute(&self, command: &str, args: &[String], cwd: &Path) -> PresetResult<Vec<String>> {
        Self::spawn(command, args, cwd)
            .and_then(Self::capture)
            .map_err(|e| e.into_preset_error(command))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_non_empty_lines() {
        let dir = tempfile::tempdir().unwrap();
        let lines = CommandShellExecutor
            .execute("printf", &["one\\n\\ntwo\\n".to_string()], dir.path())
            .unwrap();

        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn captures_stderr_alongside_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let lines = CommandShellExecutor
            .execute(
                "sh",
                &["-c".to_string(), "echo out; sleep 0.2; echo done >&2".to_string()],
                dir.path(),
            )
            .unwrap();

        assert_eq!(lines, vec!["out", "done"]);
    }

    #[test]
    fn failure_reason_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandShellExecutor
            .execute("sh", &["-c".to_string(), "echo broken >&2; exit 3".to_string()], dir.path())
            .unwrap_err();

        assert!(matches!(
            err,
            PresetError::Application(ApplicationError::CommandFailed { ref reason, .. }) if reason.contains("broken")
        ));
    }

    #[test]
    fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let lines = CommandShellExecutor.execute("pwd", &[], dir.path()).unwrap();

        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(Path::new(&lines[0]).canonicalize().unwrap(), expected);
    }

    #[test]
    fn non_zero_exit_is_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandShellExecutor.execute("false", &[], dir.path()).unwrap_err();

        assert!(matches!(
            err,
            PresetError::Application(ApplicationError::CommandFailed { ref command, .. }) if command == "false"
        ));
    }

    #[test]
    fn missing_program_is_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            CommandShellExecutor
                .execute("presetter-no-such-program", &[], dir.path())
                .is_err()
        );
    }
}
