//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `presetter-adapters` crate provides implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{CommandLineOptions, ConflictStrategy, Ecosystem, InstallMode, Preset};
use crate::error::PresetResult;

/// The declarative part of a preset: the code that adds actions.
///
/// Any `Fn(&mut Preset) -> PresetResult<()>` closure is a script.
pub trait PresetScript: Send + Sync {
    /// Name given to the preset before the script runs.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Declare the preset's actions on a freshly bound preset.
    fn configure(&self, preset: &mut Preset) -> PresetResult<()>;
}

impl<F> PresetScript for F
where
    F: Fn(&mut Preset) -> PresetResult<()> + Send + Sync,
{
    fn configure(&self, preset: &mut Preset) -> PresetResult<()> {
        self(preset)
    }
}

/// A resolved preset, ready to be configured.
#[derive(Clone)]
pub struct LoadedPreset {
    pub script: Arc<dyn PresetScript>,
    /// Directory the preset lives in; templates are looked up relative to it.
    pub directory: PathBuf,
}

impl LoadedPreset {
    pub fn new(script: Arc<dyn PresetScript>, directory: impl Into<PathBuf>) -> Self {
        Self {
            script,
            directory: directory.into(),
        }
    }
}

impl std::fmt::Debug for LoadedPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPreset")
            .field("name", &self.script.name())
            .field("directory", &self.directory)
            .finish()
    }
}

/// Port for resolving a preset reference (name, git URL, local path).
///
/// Implemented by:
/// - `presetter_adapters::loader::ManifestLoader` (local `preset.toml`)
/// - `presetter_adapters::loader::PresetRegistry` (programmatic presets)
/// - `presetter_adapters::loader::ChainLoader` (first match wins)
#[cfg_attr(test, mockall::automock)]
pub trait PresetLoader: Send + Sync {
    fn load(&self, resolvable: &str, options: &CommandLineOptions) -> PresetResult<LoadedPreset>;
}

/// Port for running a program and capturing its output.
#[cfg_attr(test, mockall::automock)]
pub trait ShellExecutor: Send + Sync {
    /// Run `command` with `args` in `cwd`; returns non-empty output lines.
    ///
    /// A non-zero exit status is an error.
    fn execute(&self, command: &str, args: &[String], cwd: &Path) -> PresetResult<Vec<String>>;
}

/// What to copy where, for one extract action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub template_root: PathBuf,
    /// File names, directory names, or `*`/`?` patterns relative to the
    /// template root. An empty string selects the whole root.
    pub inputs: Vec<String>,
    pub destination: PathBuf,
    pub conflict: ConflictStrategy,
    /// Rename `name.dotfile` to `.name`.
    pub dotfiles: bool,
}

/// Port for copying template entries into the target directory.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateExtractor: Send + Sync {
    /// Returns the destination paths that were written.
    fn extract(&self, request: &ExtractRequest) -> PresetResult<Vec<PathBuf>>;
}

/// Port for installing dependencies of an ecosystem.
#[cfg_attr(test, mockall::automock)]
pub trait DependencyInstaller: Send + Sync {
    fn install(&self, ecosystem: Ecosystem, mode: InstallMode, target: &Path) -> PresetResult<()>;
}

/// Port for git metadata and operations.
#[cfg_attr(test, mockall::automock)]
pub trait GitOperations: Send + Sync {
    /// Snapshot of the effective `git config`, keyed like `user.name`.
    fn config_snapshot(&self) -> PresetResult<BTreeMap<String, String>>;

    /// Run a git subcommand in `cwd`; returns output lines.
    fn run(&self, args: &[String], cwd: &Path) -> PresetResult<Vec<String>>;
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `presetter_adapters::filesystem::LocalFilesystem` (production)
/// - `presetter_adapters::filesystem::MemoryFilesystem` (testing)
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> PresetResult<()>;

    fn read_file(&self, path: &Path) -> PresetResult<Vec<u8>>;

    /// Write content to a file, replacing it if it exists.
    fn write_file(&self, path: &Path, content: &[u8]) -> PresetResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Files under `root`, relative to it, in a stable order.
    fn list_files(&self, root: &Path) -> PresetResult<Vec<PathBuf>>;
}
