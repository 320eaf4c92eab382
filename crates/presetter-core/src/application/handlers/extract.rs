//! Copies template entries into the target directory.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ActionHandler, ExtractAction, Handled, PresetRunner, RunContext, ValidatedAction, mismatched};
use crate::application::ports::{ExtractRequest, TemplateExtractor};
use crate::domain::{ActionKind, ConflictStrategy, OneOrMany, RawAction};
use crate::error::PresetResult;

#[derive(Debug, Deserialize)]
struct ExtractFields {
    inputs: Option<OneOrMany>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    conflict: ConflictStrategy,
    #[serde(default = "default_dotfiles")]
    dotfiles: bool,
}

fn default_dotfiles() -> bool {
    true
}

/// Handler for `extract` actions.
pub struct ExtractActionHandler {
    extractor: Arc<dyn TemplateExtractor>,
}

impl ExtractActionHandler {
    pub fn new(extractor: Arc<dyn TemplateExtractor>) -> Self {
        Self { extractor }
    }
}

impl ActionHandler for ExtractActionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Extract
    }

    fn validate(&self, raw: RawAction) -> Option<ValidatedAction> {
        let fields: ExtractFields = raw.fields_as()?;
        let mut inputs = fields.inputs.map(OneOrMany::into_vec).unwrap_or_default();
        if inputs.is_empty() {
            inputs.push(String::new());
        }

        Some(ValidatedAction::Extract(ExtractAction {
            inputs,
            target: fields.target.unwrap_or_default(),
            conflict: fields.conflict,
            dotfiles: fields.dotfiles,
        }))
    }

    #[instrument(skip_all, fields(inputs = ?action_inputs(&action)))]
    fn handle(
        &self,
        action: ValidatedAction,
        context: &RunContext,
        _runner: &dyn PresetRunner,
    ) -> PresetResult<Handled> {
        let ValidatedAction::Extract(action) = action else {
            return Err(mismatched(self.kind(), &action));
        };

        let request = ExtractRequest {
            template_root: context.template_root.clone(),
            inputs: action.inputs,
            destination: context.target_directory.join(&action.target),
            conflict: action.conflict,
            dotfiles: action.dotfiles,
        };

        let written = self.extractor.extract(&request)?;
        debug!(
            files = written.len(),
            destination = %request.destination.display(),
            "Extracted templates"
        );

        Ok(Handled::succeeded())
    }
}

fn action_inputs(action: &ValidatedAction) -> &[String] {
    match action {
        ValidatedAction::Extract(extract) => &extract.inputs,
        _ => &[],
    }
}
