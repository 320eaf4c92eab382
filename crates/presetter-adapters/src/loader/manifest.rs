//! Filesystem preset loader reading `preset.toml` manifests.
//!
//! # Directory layout expected
//!
//! ```text
//! laravel-starter/
//! ├── preset.toml          ← manifest (required)
//! └── templates/           ← extraction root (configurable)
//!     ├── app.php
//!     └── gitignore.dotfile
//! ```
//!
//! # `preset.toml` format
//!
//! ```toml
//! name      = "laravel-starter"
//! templates = "templates"          # optional, default "templates"
//!
//! [options]                         # defaults; command-line options win
//! auth = true
//!
//! [[actions]]
//! type  = "extract"                 # preset | extract | execute | dependencies | group
//! input = ["*.php"]
//! title = "Copy PHP files"
//! if    = ["options.auth"]
//!
//! [[actions]]
//! type      = "execute"
//! command   = "echo"
//! arguments = ["{{name}} installed by {{git.user.name}}"]
//!
//! [[actions]]
//! type  = "group"
//! title = "Frontend"
//! if    = "!options.api"
//!
//!   [[actions.actions]]
//!   type = "dependencies"
//!   ecosystem = "node"
//!
//! [instructions]
//! heading  = "Next steps"
//! messages = ["Run the dev server"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use presetter_core::{
    application::{
        ApplicationError,
        ports::{Filesystem, LoadedPreset, PresetLoader, PresetScript},
    },
    domain::{
        Action, ActionKind, ActionPayload, ApplyPreset, CommandLineOptions, ConflictStrategy,
        ContextValue, DomainError, Ecosystem, Execute, Extract, InstallDependencies, InstallMode,
        OneOrMany, Preset,
    },
    error::{PresetError, PresetResult},
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use super::placeholders;

pub const MANIFEST_FILE: &str = "preset.toml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("'{}' is not valid UTF-8", .0.display())]
    Encoding(PathBuf),
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl From<ManifestError> for PresetError {
    fn from(error: ManifestError) -> Self {
        PresetError::Configuration {
            message: error.to_string(),
        }
    }
}

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `preset.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetManifest {
    pub name: Option<String>,
    /// Template directory, relative to the manifest.
    pub templates: Option<String>,
    /// Option defaults.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    pub instructions: Option<InstructionsEntry>,
}

/// One entry under `[[actions]]`.
///
/// Fields are shared by every `type`; each type reads the ones it needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    #[serde(rename = "if")]
    pub conditions: Option<OneOrMany>,

    // preset
    pub preset: Option<String>,
    #[serde(alias = "argument")]
    pub arguments: Option<OneOrMany>,
    #[serde(default)]
    pub inherit: bool,

    // extract
    #[serde(alias = "input")]
    pub inputs: Option<OneOrMany>,
    pub target: Option<String>,
    pub conflict: Option<ConflictStrategy>,
    pub dotfiles: Option<bool>,

    // execute
    #[serde(alias = "command")]
    pub commands: Option<OneOrMany>,

    // dependencies
    pub ecosystem: Option<String>,
    pub mode: Option<InstallMode>,

    // group
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstructionsEntry {
    pub heading: Option<String>,
    #[serde(default, alias = "message")]
    pub messages: Option<OneOrMany>,
}

impl PresetManifest {
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ManifestError> {
        toml::from_str(raw).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ── Script ────────────────────────────────────────────────────────────────────

/// A manifest acting as a preset script.
#[derive(Debug, Clone)]
pub struct ManifestScript {
    manifest: PresetManifest,
}

impl ManifestScript {
    pub fn new(manifest: PresetManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &PresetManifest {
        &self.manifest
    }
}

impl PresetScript for ManifestScript {
    fn name(&self) -> Option<&str> {
        self.manifest.name.as_deref()
    }

    fn configure(&self, preset: &mut Preset) -> PresetResult<()> {
        if let Some(templates) = &self.manifest.templates {
            preset.set_template_directory(templates.as_str());
        }
        for (key, value) in &self.manifest.options {
            preset.option(key, value.clone());
        }

        declare(preset, &self.manifest.actions)?;

        if let Some(entry) = &self.manifest.instructions {
            let messages = entry.messages.clone().map(OneOrMany::into_vec).unwrap_or_default();
            let instructions = preset.instruct(messages);
            if let Some(heading) = &entry.heading {
                instructions.with_heading(heading.as_str());
            }
        }
        Ok(())
    }
}

fn conditions(entry: &ActionEntry) -> Result<Vec<ContextValue<bool>>, DomainError> {
    entry
        .conditions
        .clone()
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .iter()
        .map(|c| placeholders::condition(c))
        .collect()
}

fn list(values: &Option<OneOrMany>) -> Option<ContextValue<Vec<String>>> {
    values.clone().map(|v| placeholders::list(v.into_vec()))
}

fn declare(preset: &mut Preset, entries: &[ActionEntry]) -> PresetResult<()> {
    for entry in entries {
        if entry.kind.eq_ignore_ascii_case("group") {
            let mut group = preset.pending_group();
            for condition in conditions(entry)? {
                group = group.when(condition);
            }
            if let Some(title) = &entry.title {
                group = group.with_title(placeholders::text(title));
            }
            group.commit(|p| declare(p, &entry.actions))?;
            continue;
        }

        let mut action = Action::new(payload(entry)?);
        for condition in conditions(entry)? {
            action = action.when(condition);
        }
        if let Some(title) = &entry.title {
            action = action.with_title(placeholders::text(title));
        }
        preset.add_action(action);
    }
    Ok(())
}

fn payload(entry: &ActionEntry) -> Result<ActionPayload, DomainError> {
    let kind: ActionKind = entry.kind.parse()?;

    Ok(match kind {
        ActionKind::Preset => ApplyPreset {
            preset: placeholders::text(entry.preset.as_deref().unwrap_or_default()),
            arguments: list(&entry.arguments).unwrap_or_default(),
            inherit: entry.inherit,
        }
        .into(),
        ActionKind::Extract => {
            let defaults = Extract::default();
            Extract {
                inputs: list(&entry.inputs).unwrap_or(defaults.inputs),
                target: entry
                    .target
                    .as_deref()
                    .map(placeholders::text)
                    .unwrap_or(defaults.target),
                conflict: entry.conflict.unwrap_or(defaults.conflict),
                dotfiles: entry.dotfiles.unwrap_or(defaults.dotfiles),
            }
            .into()
        }
        ActionKind::Execute => Execute {
            commands: list(&entry.commands).unwrap_or_default(),
            arguments: list(&entry.arguments).unwrap_or_default(),
        }
        .into(),
        ActionKind::Dependencies => InstallDependencies {
            ecosystem: match &entry.ecosystem {
                Some(name) => name.parse::<Ecosystem>()?.into(),
                None => Ecosystem::default().into(),
            },
            mode: entry.mode.unwrap_or_default(),
        }
        .into(),
    })
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Resolves presets to directories containing a `preset.toml`.
///
/// A resolvable is a path (absolute, `./relative`, or `~/in-home`) or a bare
/// name looked up in each search path in turn. `options.path` selects a
/// sub-directory of the resolved directory.
pub struct ManifestLoader {
    filesystem: Arc<dyn Filesystem>,
    search_paths: Vec<PathBuf>,
}

impl ManifestLoader {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            filesystem,
            search_paths: Vec::new(),
        }
    }

    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths = paths.into_iter().map(|p| expand_home(p.as_ref())).collect();
        self
    }

    fn candidates(&self, resolvable: &str) -> Vec<PathBuf> {
        let path = expand_home(Path::new(resolvable));
        let explicit = path.is_absolute()
            || resolvable.starts_with('.')
            || resolvable.contains(['/', '\\']);

        if explicit {
            vec![path]
        } else {
            self.search_paths.iter().map(|root| root.join(resolvable)).collect()
        }
    }

    fn not_found(resolvable: &str, reason: impl Into<String>) -> PresetError {
        ApplicationError::PresetResolution {
            resolvable: resolvable.to_owned(),
            reason: reason.into(),
        }
        .into()
    }
}

impl std::fmt::Debug for ManifestLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestLoader")
            .field("search_paths", &self.search_paths)
            .finish_non_exhaustive()
    }
}

impl PresetLoader for ManifestLoader {
    #[instrument(skip(self, options))]
    fn load(&self, resolvable: &str, options: &CommandLineOptions) -> PresetResult<LoadedPreset> {
        if is_remote(resolvable) {
            return Err(Self::not_found(
                resolvable,
                "remote repositories are not supported; clone it and pass the local path",
            ));
        }

        for candidate in self.candidates(resolvable) {
            let directory = match &options.path {
                Some(sub) => candidate.join(sub),
                None => candidate,
            };
            let manifest_path = directory.join(MANIFEST_FILE);
            if !self.filesystem.exists(&manifest_path) {
                debug!(path = %manifest_path.display(), "No manifest");
                continue;
            }

            let bytes = self.filesystem.read_file(&manifest_path)?;
            let raw = String::from_utf8(bytes)
                .map_err(|_| ManifestError::Encoding(manifest_path.clone()))?;
            let manifest = PresetManifest::parse(&raw, &manifest_path)?;
            debug!(path = %manifest_path.display(), actions = manifest.actions.len(), "Manifest loaded");

            return Ok(LoadedPreset::new(
                Arc::new(ManifestScript::new(manifest)),
                directory,
            ));
        }

        Err(Self::not_found(
            resolvable,
            format!("no {MANIFEST_FILE} found"),
        ))
    }
}

fn is_remote(resolvable: &str) -> bool {
    ["http://", "https://", "git@", "ssh://", "git://"]
        .iter()
        .any(|scheme| resolvable.starts_with(scheme))
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
