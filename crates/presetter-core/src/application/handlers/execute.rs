//! Runs shell commands in the target directory.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ActionHandler, ExecuteAction, Handled, PresetRunner, RunContext, ValidatedAction, mismatched};
use crate::application::ports::ShellExecutor;
use crate::domain::{ActionKind, OneOrMany, RawAction};
use crate::error::PresetResult;

#[derive(Debug, Deserialize)]
struct ExecuteFields {
    commands: Option<OneOrMany>,
    arguments: Option<OneOrMany>,
}

/// Handler for `execute` actions.
///
/// Every command receives the same arguments and runs with the target
/// directory as its working directory, one after another.
pub struct ExecuteActionHandler {
    shell: Arc<dyn ShellExecutor>,
}

impl ExecuteActionHandler {
    pub fn new(shell: Arc<dyn ShellExecutor>) -> Self {
        Self { shell }
    }
}

impl ActionHandler for ExecuteActionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Execute
    }

    fn validate(&self, raw: RawAction) -> Option<ValidatedAction> {
        let fields: ExecuteFields = raw.fields_as()?;
        let commands: Vec<String> = fields
            .commands?
            .into_vec()
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();

        if commands.is_empty() {
            return None;
        }

        Some(ValidatedAction::Execute(ExecuteAction {
            commands,
            arguments: fields.arguments.map(OneOrMany::into_vec).unwrap_or_default(),
        }))
    }

    #[instrument(skip_all, fields(target = %context.target_directory.display()))]
    fn handle(
        &self,
        action: ValidatedAction,
        context: &RunContext,
        _runner: &dyn PresetRunner,
    ) -> PresetResult<Handled> {
        let ValidatedAction::Execute(action) = action else {
            return Err(mismatched(self.kind(), &action));
        };

        let mut output = Vec::new();
        for command in &action.commands {
            debug!(%command, arguments = ?action.arguments, "Running command");
            let lines = self
                .shell
                .execute(command, &action.arguments, &context.target_directory)?;
            for line in &lines {
                debug!(%command, "{line}");
            }
            output.extend(lines);
        }

        Ok(Handled::succeeded().with_output(output))
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use mockall::Sequence;
    use mockall::predicate::eq;

    use super::*;
    use crate::application::ApplicationError;
    use crate::application::handlers::MockPresetRunner;
    use crate::application::ports::MockShellExecutor;
    use crate::domain::CommandLineOptions;

    fn context() -> RunContext {
        RunContext {
            target_directory: PathBuf::from("/work/app"),
            argv: vec![],
            template_root: PathBuf::from("/presets/app/templates"),
            options: CommandLineOptions::default(),
            depth: 0,
        }
    }

    #[test]
    fn validate_drops_blank_commands() {
        let handler = ExecuteActionHandler::new(Arc::new(MockShellExecutor::new()));

        let raw = RawAction::new(ActionKind::Execute)
            .with("commands", serde_json::json!(["git", ""]))
            .with("arguments", "init");
        assert_eq!(
            handler.validate(raw),
            Some(ValidatedAction::Execute(ExecuteAction {
                commands: vec!["git".into()],
                arguments: vec!["init".into()],
            }))
        );

        let blank = RawAction::new(ActionKind::Execute).with("commands", "");
        assert_eq!(handler.validate(blank), None);
        assert_eq!(handler.validate(RawAction::new(ActionKind::Execute)), None);
    }

    #[test]
    fn runs_commands_in_order_in_target_directory() {
        let mut shell = MockShellExecutor::new();
        let mut seq = Sequence::new();
        for command in ["git", "echo"] {
            shell
                .expect_execute()
                .with(
                    eq(command),
                    eq(vec!["init".to_string()]),
                    eq(Path::new("/work/app")),
                )
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _, _| Ok(vec![format!("{command} done")]));
        }

        let handler = ExecuteActionHandler::new(Arc::new(shell));
        let action = ValidatedAction::Execute(ExecuteAction {
            commands: vec!["git".into(), "echo".into()],
            arguments: vec!["init".into()],
        });

        let handled = handler.handle(action, &context(), &MockPresetRunner::new()).unwrap();
        assert!(handled.success);
        assert_eq!(handled.output, vec!["git done", "echo done"]);
    }

    #[test]
    fn command_failure_propagates() {
        let mut shell = MockShellExecutor::new();
        shell.expect_execute().returning(|command, _, _| {
            Err(ApplicationError::CommandFailed {
                command: command.to_string(),
                reason: "exit status 1".into(),
            }
            .into())
        });

        let handler = ExecuteActionHandler::new(Arc::new(shell));
        let action = ValidatedAction::Execute(ExecuteAction {
            commands: vec!["false".into()],
            arguments: vec![],
        });

        assert!(handler.handle(action, &context(), &MockPresetRunner::new()).is_err());
    }
}
