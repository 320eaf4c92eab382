//! Presets registered in code, looked up by name.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use presetter_core::{
    application::{
        ApplicationError,
        ports::{LoadedPreset, PresetLoader, PresetScript},
    },
    domain::{CommandLineOptions, Preset},
    error::PresetResult,
};

/// In-memory [`PresetLoader`] for programmatic presets.
///
/// ```rust
/// use presetter_adapters::loader::PresetRegistry;
///
/// let mut registry = PresetRegistry::new();
/// registry.register_fn("hello", "/presets/hello", |preset| {
///     preset.execute("echo").with_arguments("hello");
///     Ok(())
/// });
/// assert!(registry.contains("hello"));
/// ```
#[derive(Default, Clone)]
pub struct PresetRegistry {
    presets: BTreeMap<String, LoadedPreset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        script: Arc<dyn PresetScript>,
    ) -> &mut Self {
        self.presets
            .insert(name.into(), LoadedPreset::new(script, directory));
        self
    }

    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        script: F,
    ) -> &mut Self
    where
        F: Fn(&mut Preset) -> PresetResult<()> + Send + Sync + 'static,
    {
        self.register(name, directory, Arc::new(script))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("presets", &self.presets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PresetLoader for PresetRegistry {
    fn load(&self, resolvable: &str, _options: &CommandLineOptions) -> PresetResult<LoadedPreset> {
        self.presets.get(resolvable).cloned().ok_or_else(|| {
            ApplicationError::PresetResolution {
                resolvable: resolvable.to_owned(),
                reason: "not registered".into(),
            }
            .into()
        })
    }
}
