//! Tries several loaders in order, after alias expansion.

use std::collections::BTreeMap;

use presetter_core::{
    application::{
        ApplicationError,
        ports::{LoadedPreset, PresetLoader},
    },
    domain::CommandLineOptions,
    error::{PresetError, PresetResult},
};
use tracing::{debug, instrument};

/// First loader that resolves wins.
///
/// "Not found" from one loader moves on to the next; any other error (a
/// malformed manifest, say) stops the search.
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn PresetLoader>>,
    aliases: BTreeMap<String, String>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl PresetLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Map short names to resolvables, e.g. `laravel` → `~/presets/laravel`.
    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl PresetLoader for ChainLoader {
    #[instrument(skip(self, options))]
    fn load(&self, resolvable: &str, options: &CommandLineOptions) -> PresetResult<LoadedPreset> {
        let target = match self.aliases.get(resolvable) {
            Some(alias) => {
                debug!(%alias, "Expanded alias");
                alias.as_str()
            }
            None => resolvable,
        };

        let mut reasons = Vec::new();
        for loader in &self.loaders {
            match loader.load(target, options) {
                Ok(loaded) => return Ok(loaded),
                Err(PresetError::Application(ApplicationError::PresetResolution { reason, .. })) => {
                    reasons.push(reason);
                }
                Err(other) => return Err(other),
            }
        }

        Err(ApplicationError::PresetResolution {
            resolvable: resolvable.to_owned(),
            reason: if reasons.is_empty() {
                "no preset loaders configured".into()
            } else {
                reasons.join("; ")
            },
        }
        .into())
    }
}
