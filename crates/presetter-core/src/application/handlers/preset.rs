//! Applies another preset to the same target directory.

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{ActionHandler, Handled, PresetAction, PresetRunner, RunContext, ValidatedAction, mismatched};
use crate::application::services::ApplierOptions;
use crate::domain::{ActionKind, OneOrMany, RawAction};
use crate::error::PresetResult;

#[derive(Debug, Deserialize)]
struct PresetFields {
    preset: Option<String>,
    arguments: Option<OneOrMany>,
    #[serde(default)]
    inherit: bool,
}

/// Handler for `preset` actions.
///
/// Failures of the nested run never reach the parent: they are logged and
/// reported as an unsuccessful [`Handled`]. A finished nested run is attached
/// to the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct PresetActionHandler;

impl PresetActionHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ActionHandler for PresetActionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Preset
    }

    fn validate(&self, raw: RawAction) -> Option<ValidatedAction> {
        let fields: PresetFields = raw.fields_as()?;
        let preset = fields.preset.filter(|p| !p.trim().is_empty())?;

        Some(ValidatedAction::Preset(PresetAction {
            preset,
            arguments: fields.arguments.map(OneOrMany::into_vec).unwrap_or_default(),
            inherit: fields.inherit,
        }))
    }

    #[instrument(skip_all, fields(depth = context.depth))]
    fn handle(
        &self,
        action: ValidatedAction,
        context: &RunContext,
        runner: &dyn PresetRunner,
    ) -> PresetResult<Handled> {
        let ValidatedAction::Preset(action) = action else {
            return Err(mismatched(self.kind(), &action));
        };

        let mut args = action.arguments;
        if action.inherit {
            args.extend(context.argv.iter().cloned());
        }

        // The sub-preset applies to the parent's target, not to a `--path`
        // the parent was given.
        let mut options = context.options.clone();
        options.path = None;

        debug!(preset = %action.preset, ?args, "Applying nested preset");

        let nested = ApplierOptions {
            resolvable: action.preset.clone(),
            target: context.target_directory.clone(),
            options,
            args,
            depth: context.depth + 1,
        };

        match runner.run(nested) {
            Ok(report) => {
                let handled = if report.is_success() {
                    Handled::succeeded()
                } else {
                    Handled::failed()
                };
                Ok(handled.with_nested(report))
            }
            Err(error) => {
                warn!(preset = %action.preset, %error, "Nested preset failed");
                Ok(Handled::failed())
            }
        }
    }
}
