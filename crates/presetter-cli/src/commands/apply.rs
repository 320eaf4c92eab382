//! Implementation of `presetter apply`.
//!
//! Translates CLI arguments into [`ApplierOptions`], wires the adapters into
//! an [`Applier`], runs it, and prints the report. No preset logic lives here.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use presetter_adapters::{
    ChainLoader, CommandShellExecutor, FilesystemExtractor, GitCli, LocalFilesystem,
    ManifestLoader, PackageManagerInstaller,
};
use presetter_core::prelude::*;

use crate::{
    cli::{ApplyArgs, OutputFormat},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Execute `presetter apply`.
///
/// 1. Resolve the target directory against the working directory
/// 2. Merge config defaults and flags into [`CommandLineOptions`]
/// 3. Ask before touching a non-empty directory, unless `--yes`
/// 4. Run the preset and print its report
#[instrument(skip_all, fields(preset = %args.resolvable))]
pub fn execute(args: ApplyArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let cwd = std::env::current_dir()
        .with_cli_context(|| "failed to read the working directory")?;
    let target = resolve_target(&cwd, args.target.as_deref());
    let options = build_options(&args, &config);

    let interactive = options.interaction != Some(false)
        && io::stdin().is_terminal()
        && !output.is_quiet()
        && output.format() != OutputFormat::Json;
    if !args.yes && interactive && !is_empty_dir(&target)? {
        let prompt = format!(
            "{} is not empty. Apply '{}' anyway?",
            target.display(),
            args.resolvable
        );
        if !confirm(&prompt)? {
            return Err(CliError::Cancelled);
        }
    }

    fs::create_dir_all(&target)
        .with_cli_context(|| format!("failed to create '{}'", target.display()))?;

    let applier = build_applier(&config, &target);
    debug!(
        target = %target.display(),
        max_depth = applier.settings().max_depth,
        handlers = applier.registry().len(),
        "Applier ready"
    );

    let report = applier.run(
        ApplierOptions::new(args.resolvable, &target)
            .with_options(options)
            .with_args(args.args),
    )?;
    info!(preset = %report.preset, actions = report.actions.len(), "Preset applied");

    output.report(&report)?;

    match report.count(ActionOutcome::Failed) {
        0 => Ok(()),
        failed => Err(CliError::ActionsFailed {
            preset: report.preset,
            failed,
        }),
    }
}

/// `None` → working directory; relative paths are joined onto it.
fn resolve_target(cwd: &Path, target: Option<&Path>) -> PathBuf {
    match target {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd.to_path_buf(),
    }
}

/// Config defaults first, then flags, then `-o` pairs in the order given.
fn build_options(args: &ApplyArgs, config: &AppConfig) -> CommandLineOptions {
    let mut options = CommandLineOptions {
        path: args.path.clone(),
        ssh: Some(args.ssh || config.defaults.ssh),
        interaction: Some(config.defaults.interaction && !args.no_interaction),
        ..CommandLineOptions::default()
    };
    for (key, value) in &args.options {
        options.set(key, value.clone());
    }
    options
}

/// A missing directory counts as empty.
fn is_empty_dir(path: &Path) -> CliResult<bool> {
    match fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(CliError::IoError {
            message: format!("failed to read '{}'", path.display()),
            source: e,
        }),
    }
}

fn build_applier(config: &AppConfig, target: &Path) -> Applier {
    let filesystem: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let shell: Arc<dyn ShellExecutor> = Arc::new(CommandShellExecutor::new());

    let loader = ChainLoader::new()
        .with_aliases(config.presets.aliases.clone())
        .with(
            ManifestLoader::new(filesystem.clone())
                .with_search_paths(&config.presets.search_paths),
        );

    let handlers = HandlerRegistry::standard(
        shell.clone(),
        Arc::new(FilesystemExtractor::new(filesystem.clone())),
        Arc::new(PackageManagerInstaller::new(shell.clone(), filesystem)),
    );

    Applier::new(Box::new(loader), handlers)
        .with_git(Arc::new(GitCli::new(shell, target)))
        .with_settings(ApplierSettings {
            max_depth: config.presets.max_depth,
        })
}

#[cfg(feature = "interactive")]
fn confirm(prompt: &str) -> CliResult<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation".into(),
            source: io::Error::other(e),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm(_prompt: &str) -> CliResult<bool> {
    Err(CliError::InvalidInput {
        message: "target directory is not empty; pass --yes to apply anyway".into(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> ApplyArgs {
        ApplyArgs {
            resolvable: "web".into(),
            target: None,
            path: None,
            ssh: false,
            no_interaction: false,
            options: Vec::new(),
            yes: false,
            args: Vec::new(),
        }
    }

    #[test]
    fn target_defaults_to_working_directory() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_target(cwd, None), PathBuf::from("/work"));
        assert_eq!(
            resolve_target(cwd, Some(Path::new("app"))),
            PathBuf::from("/work/app")
        );
        assert_eq!(
            resolve_target(cwd, Some(Path::new("/srv/app"))),
            PathBuf::from("/srv/app")
        );
    }

    #[test]
    fn flags_override_config_defaults() {
        let mut args = args();
        args.no_interaction = true;
        args.path = Some("stubs".into());

        let options = build_options(&args, &AppConfig::default());
        assert_eq!(options.interaction, Some(false));
        assert_eq!(options.ssh, Some(false));
        assert_eq!(options.path.as_deref(), Some("stubs"));
    }

    #[test]
    fn config_can_disable_interaction() {
        let mut config = AppConfig::default();
        config.defaults.interaction = false;
        config.defaults.ssh = true;

        let options = build_options(&args(), &config);
        assert_eq!(options.interaction, Some(false));
        assert_eq!(options.ssh, Some(true));
    }

    #[test]
    fn option_pairs_land_in_options() {
        let mut args = args();
        args.options = vec![
            ("auth".into(), json!(true)),
            ("stack".into(), json!("vue")),
            ("ssh".into(), json!(true)),
        ];

        let options = build_options(&args, &AppConfig::default());
        assert!(options.is_enabled("auth"));
        assert_eq!(options.get("stack"), Some(json!("vue")));
        assert_eq!(options.ssh, Some(true));
    }

    #[test]
    fn emptiness_of_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_empty_dir(dir.path()).unwrap());
        assert!(is_empty_dir(&dir.path().join("missing")).unwrap());

        fs::write(dir.path().join("a.txt"), "a").unwrap();
        assert!(!is_empty_dir(dir.path()).unwrap());
    }

    #[test]
    fn applier_uses_configured_depth() {
        let mut config = AppConfig::default();
        config.presets.max_depth = 3;

        let applier = build_applier(&config, Path::new("."));
        assert_eq!(applier.settings().max_depth, 3);
        assert_eq!(applier.registry().len(), 4);
    }
}
