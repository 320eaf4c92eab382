//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The CLI
//! layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (applied at the call-site, not here)
//! 2. Environment variables, `PRESETTER__SECTION__KEY`
//! 3. `--config FILE`, or `.presetter.toml` in the current directory
//! 4. The global config file ([`AppConfig::config_path`])
//! 5. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use presetter_core::application::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// File name of a project-local configuration.
pub const LOCAL_CONFIG_FILE: &str = ".presetter.toml";

const ENV_PREFIX: &str = "PRESETTER";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for every `apply`.
    pub defaults: Defaults,
    pub output: OutputConfig,
    /// Where presets come from.
    pub presets: PresetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub interaction: bool,
    pub ssh: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    /// Nesting limit for presets applying presets.
    pub max_depth: usize,
    /// Directories searched for bare preset names, in order.
    pub search_paths: Vec<PathBuf>,
    /// Short name → preset path.
    pub aliases: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            output: OutputConfig::default(),
            presets: PresetConfig::default(),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            interaction: true,
            ssh: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            search_paths: vec![PathBuf::from("."), AppConfig::presets_dir()],
            aliases: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and the environment.
    ///
    /// An explicit `config_file` must exist; the global and local files are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let mut files = vec![(Self::config_path(), false)];
        match config_file {
            Some(path) => files.push((path.clone(), true)),
            None => files.push((PathBuf::from(LOCAL_CONFIG_FILE), false)),
        }

        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("presets.search_paths");

        Self::from_sources(&files, env)
    }

    /// Layer `files` (path, required) and `env` over the built-in defaults.
    fn from_sources(files: &[(PathBuf, bool)], env: Environment) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Self::default()).context("Failed to encode default configuration")?,
        );
        for (path, required) in files {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(*required),
            );
        }

        builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the global configuration file.
    ///
    /// Uses `directories::ProjectDirs`, falling back to `.presetter.toml` in
    /// the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "presetter", "presetter")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Default directory for installed presets.
    pub fn presets_dir() -> PathBuf {
        directories::ProjectDirs::from("dev", "presetter", "presetter")
            .map(|d| d.data_dir().join("presets"))
            .unwrap_or_else(|| PathBuf::from("presets"))
    }
}
