//! Preset loaders: turn a resolvable into a preset script.

mod chain;
mod manifest;
pub mod placeholders;
mod registry;

pub use chain::ChainLoader;
pub use manifest::{
    ActionEntry, InstructionsEntry, MANIFEST_FILE, ManifestError, ManifestLoader, ManifestScript,
    PresetManifest, expand_home,
};
pub use registry::PresetRegistry;
