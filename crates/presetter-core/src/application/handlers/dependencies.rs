//! Installs or updates dependencies of a package ecosystem.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use super::{
    ActionHandler, DependenciesAction, Handled, PresetRunner, RunContext, ValidatedAction,
    mismatched,
};
use crate::application::ports::DependencyInstaller;
use crate::domain::{ActionKind, Ecosystem, InstallMode, RawAction};
use crate::error::PresetResult;

#[derive(Debug, Deserialize)]
struct DependenciesFields {
    ecosystem: Option<String>,
    #[serde(default)]
    mode: InstallMode,
}

/// Handler for `dependencies` actions.
pub struct DependenciesActionHandler {
    installer: Arc<dyn DependencyInstaller>,
}

impl DependenciesActionHandler {
    pub fn new(installer: Arc<dyn DependencyInstaller>) -> Self {
        Self { installer }
    }
}

impl ActionHandler for DependenciesActionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Dependencies
    }

    fn validate(&self, raw: RawAction) -> Option<ValidatedAction> {
        let fields: DependenciesFields = raw.fields_as()?;
        let ecosystem = match fields.ecosystem {
            Some(name) => name.parse::<Ecosystem>().ok()?,
            None => Ecosystem::default(),
        };

        Some(ValidatedAction::Dependencies(DependenciesAction {
            ecosystem,
            mode: fields.mode,
        }))
    }

    #[instrument(skip_all, fields(target = %context.target_directory.display()))]
    fn handle(
        &self,
        action: ValidatedAction,
        context: &RunContext,
        _runner: &dyn PresetRunner,
    ) -> PresetResult<Handled> {
        let ValidatedAction::Dependencies(action) = action else {
            return Err(mismatched(self.kind(), &action));
        };

        self.installer
            .install(action.ecosystem, action.mode, &context.target_directory)?;
        Ok(Handled::succeeded())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use mockall::predicate::eq;

    use super::*;
    use crate::application::handlers::MockPresetRunner;
    use crate::application::ports::MockDependencyInstaller;
    use crate::domain::CommandLineOptions;

    #[test]
    fn validate_accepts_package_manager_aliases() {
        let handler = DependenciesActionHandler::new(Arc::new(MockDependencyInstaller::new()));
        let raw = RawAction::new(ActionKind::Dependencies)
            .with("ecosystem", "composer")
            .with("mode", "update");

        assert_eq!(
            handler.validate(raw),
            Some(ValidatedAction::Dependencies(DependenciesAction {
                ecosystem: Ecosystem::Php,
                mode: InstallMode::Update,
            }))
        );
    }

    #[test]
    fn validate_rejects_unknown_ecosystem() {
        let handler = DependenciesActionHandler::new(Arc::new(MockDependencyInstaller::new()));
        let raw = RawAction::new(ActionKind::Dependencies).with("ecosystem", "cargo");
        assert_eq!(handler.validate(raw), None);
    }

    #[test]
    fn installs_into_target_directory() {
        let mut installer = MockDependencyInstaller::new();
        installer
            .expect_install()
            .with(
                eq(Ecosystem::Node),
                eq(InstallMode::Install),
                eq(Path::new("/work/app")),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let handler = DependenciesActionHandler::new(Arc::new(installer));
        let context = RunContext {
            target_directory: PathBuf::from("/work/app"),
            argv: vec![],
            template_root: PathBuf::new(),
            options: CommandLineOptions::default(),
            depth: 0,
        };
        let action = ValidatedAction::Dependencies(DependenciesAction {
            ecosystem: Ecosystem::Node,
            mode: InstallMode::Install,
        });

        assert!(handler.handle(action, &context, &MockPresetRunner::new()).unwrap().success);
    }
}
