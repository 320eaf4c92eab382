//! CLI argument definitions using the clap derive API.
//!
//! This module is the only place that knows about argument names, aliases,
//! help text, and value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "presetter",
    bin_name = "presetter",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Apply composable presets to a project directory",
    long_about = "Presetter applies presets (ordered lists of extract, execute, \
                  dependency and nested-preset actions) to a target directory.",
    after_help = "EXAMPLES:\n\
        \x20 presetter apply ./presets/laravel\n\
        \x20 presetter apply laravel my-app -o auth=true -- --ssr\n\
        \x20 presetter init --local\n\
        \x20 presetter completions bash > /usr/share/bash-completion/completions/presetter",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a preset to a directory.
    #[command(
        visible_alias = "a",
        about = "Apply a preset",
        after_help = "EXAMPLES:\n\
            \x20 presetter apply ./my-preset\n\
            \x20 presetter apply laravel --path stubs/auth\n\
            \x20 presetter apply vue . -o ts -o store=pinia -- --force"
    )]
    Apply(ApplyArgs),

    /// Initialise a Presetter configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 presetter init           # default location\n\
            \x20 presetter init --global  # global config\n\
            \x20 presetter init --local   # .presetter.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 presetter completions bash > ~/.local/share/bash-completion/completions/presetter\n\
            \x20 presetter completions zsh  > ~/.zfunc/_presetter\n\
            \x20 presetter completions fish > ~/.config/fish/completions/presetter.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Presetter configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 presetter config get presets.max_depth\n\
            \x20 presetter config list\n\
            \x20 presetter config path"
    )]
    Config(ConfigCommands),
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `presetter apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Preset to apply: a directory path, a registered name, or an alias.
    #[arg(value_name = "PRESET", help = "Preset path, name, or alias")]
    pub resolvable: String,

    /// Directory the preset is applied to.
    #[arg(
        value_name = "TARGET",
        help = "Target directory (default: current directory)"
    )]
    pub target: Option<PathBuf>,

    #[arg(
        long = "path",
        value_name = "DIR",
        help = "Sub-directory of the preset that holds preset.toml"
    )]
    pub path: Option<String>,

    #[arg(long = "ssh", help = "Prefer SSH for remote presets")]
    pub ssh: bool,

    #[arg(
        short = 'n',
        long = "no-interaction",
        help = "Disable interactive prompts"
    )]
    pub no_interaction: bool,

    /// Extra options for the preset. A bare `key` means `key=true`; values are
    /// parsed as JSON when possible and kept as strings otherwise.
    #[arg(
        short = 'o',
        long = "option",
        value_name = "KEY=VALUE",
        value_parser = parse_option,
        help = "Preset option (repeatable)"
    )]
    pub options: Vec<(String, Value)>,

    #[arg(
        short = 'y',
        long = "yes",
        help = "Apply to a non-empty directory without asking"
    )]
    pub yes: bool,

    /// Arguments forwarded to the preset, after `--`.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// `key=value` → `(key, value)`; a bare `key` is `true`.
fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = match raw.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value)),
        None => (raw.trim(), None),
    };
    if key.is_empty() {
        return Err(format!("option '{raw}' has no key"));
    }

    let value = match value {
        None => Value::Bool(true),
        Some(v) => serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_owned())),
    };
    Ok((key.to_owned(), value))
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `presetter init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to the global config location.
    #[arg(long = "global", conflicts_with = "local", help = "Create global configuration")]
    pub global: bool,

    /// Write to `.presetter.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `presetter config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `presets.max_depth`.
        key: String,
    },
    /// Print the effective configuration.
    List,
    /// Print the path to the global configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn option_values_are_typed() {
        assert_eq!(parse_option("auth").unwrap(), ("auth".into(), json!(true)));
        assert_eq!(parse_option("auth=false").unwrap(), ("auth".into(), json!(false)));
        assert_eq!(parse_option("port=8080").unwrap(), ("port".into(), json!(8080)));
        assert_eq!(parse_option("stack=vue").unwrap(), ("stack".into(), json!("vue")));
        assert_eq!(parse_option("empty=").unwrap(), ("empty".into(), json!("")));
    }

    #[test]
    fn option_without_key_is_rejected() {
        assert!(parse_option("=value").is_err());
    }

    #[test]
    fn apply_collects_options_and_trailing_args() {
        let cli = Cli::try_parse_from([
            "presetter", "apply", "laravel", "app", "-o", "auth", "--path", "stubs", "-n", "--",
            "--ssr", "--ts",
        ])
        .unwrap();

        let Commands::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.resolvable, "laravel");
        assert_eq!(args.target, Some(PathBuf::from("app")));
        assert_eq!(args.path.as_deref(), Some("stubs"));
        assert!(args.no_interaction);
        assert_eq!(args.options, vec![("auth".to_string(), json!(true))]);
        assert_eq!(args.args, vec!["--ssr", "--ts"]);
    }

    #[test]
    fn init_scopes_conflict() {
        assert!(Cli::try_parse_from(["presetter", "init", "--global", "--local"]).is_err());
    }
}
