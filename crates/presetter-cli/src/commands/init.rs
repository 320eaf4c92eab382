//! `presetter init`: write a default configuration file.

use std::fs;
use std::path::PathBuf;

use crate::{
    cli::InitArgs,
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliResult, IntoCli},
    output::OutputManager,
};

pub fn execute(args: InitArgs, output: OutputManager) -> CliResult<()> {
    let config_path = destination(&args);
    output.info(&format!("Writing configuration to {}", config_path.display()))?;

    if config_path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {}  (use --force to overwrite)",
            config_path.display(),
        ))?;
        return Ok(());
    }

    let toml = toml::to_string_pretty(&AppConfig::default())
        .with_cli_context(|| "Failed to serialise default config")?;

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }

    fs::write(&config_path, toml)
        .with_cli_context(|| format!("Failed to write config to '{}'", config_path.display()))?;

    output.success(&format!("Configuration created at {}", config_path.display()))?;
    Ok(())
}

/// `--local` writes next to the project, anything else to the global file.
fn destination(args: &InitArgs) -> PathBuf {
    match (args.global, args.local) {
        (false, true) => PathBuf::from(LOCAL_CONFIG_FILE),
        _ => AppConfig::config_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_lives_in_working_directory() {
        let args = InitArgs {
            global: false,
            local: true,
            force: false,
        };
        assert_eq!(destination(&args), PathBuf::from(".presetter.toml"));
    }

    #[test]
    fn global_is_the_default() {
        let args = InitArgs {
            global: false,
            local: false,
            force: false,
        };
        assert_eq!(destination(&args), AppConfig::config_path());
    }
}
