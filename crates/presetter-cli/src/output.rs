//! Output management and formatting.

use std::io::{self, IsTerminal};

use chrono::TimeDelta;
use console::Term;
use owo_colors::OwoColorize;
use presetter_core::domain::Instructions;
use presetter_core::prelude::{ActionOutcome, RunReport};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliResult;

/// Writes everything the user sees on stdout.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    ///
    /// `--output-format` wins over `output.format` unless it was left at
    /// `auto`.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => OutputFormat::from_config(&config.output.format),
            explicit => explicit,
        };
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// `✓ <msg>`
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}")
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// `⚠ <msg>`
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}")
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// `ℹ <msg>`
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}")
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    // ── Run reports ───────────────────────────────────────────────────────

    /// Print the outcome of a run, one line per action, then the preset's
    /// instructions. In JSON mode the whole report is printed instead, even
    /// when quiet.
    pub fn report(&self, report: &RunReport) -> CliResult<()> {
        if self.resolved_format == OutputFormat::Json {
            let json = serde_json::to_string_pretty(report).map_err(io::Error::from)?;
            self.term.write_line(&json)?;
            return Ok(());
        }

        self.header(&format!(
            "Applied '{}' to {}",
            report.preset,
            report.target.display()
        ))?;

        for line in report_lines(report) {
            self.report_line(&line)?;
        }

        self.info(&summary_line(report))?;

        for instructions in collect_instructions(report) {
            self.print("")?;
            self.header(instructions.heading.as_deref().unwrap_or("Next steps"))?;
            for message in &instructions.messages {
                self.print(&format!("  {message}"))?;
            }
        }

        Ok(())
    }

    fn report_line(&self, line: &ReportLine) -> io::Result<()> {
        let failed = line.outcome == Some(ActionOutcome::Failed);
        if self.quiet && !failed {
            return Ok(());
        }

        let indent = "  ".repeat(line.depth);
        let text = match line.outcome {
            None => format!("{indent}  | {}", line.text),
            Some(ActionOutcome::Succeeded) => format!("{indent}\u{2713} {}", line.text),
            Some(ActionOutcome::Failed) => format!("{indent}\u{2717} {}", line.text),
            Some(ActionOutcome::Skipped) => format!("{indent}- {} (skipped)", line.text),
            Some(ActionOutcome::Invalid) => {
                format!("{indent}\u{26a0} {} (invalid, ignored)", line.text)
            }
        };
        if self.no_color {
            return self.term.write_line(&text);
        }

        let painted = match line.outcome {
            None | Some(ActionOutcome::Skipped) => text.dimmed().to_string(),
            Some(ActionOutcome::Succeeded) => text.green().to_string(),
            Some(ActionOutcome::Failed) => text.red().to_string(),
            Some(ActionOutcome::Invalid) => text.yellow().to_string(),
        };
        self.term.write_line(&painted)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

/// A printable line of a report. `outcome` is `None` for captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportLine {
    depth: usize,
    outcome: Option<ActionOutcome>,
    text: String,
}

/// Actions with their output, nested runs indented under the action that
/// applied them.
fn report_lines(report: &RunReport) -> Vec<ReportLine> {
    let mut lines = Vec::new();
    push_report_lines(report, 0, &mut lines);
    lines
}

fn push_report_lines(report: &RunReport, depth: usize, lines: &mut Vec<ReportLine>) {
    for record in &report.actions {
        let text = match &record.title {
            Some(title) => format!("{title} ({})", record.kind),
            None => record.kind.to_string(),
        };
        lines.push(ReportLine {
            depth,
            outcome: Some(record.outcome),
            text,
        });
        lines.extend(record.output.iter().map(|text| ReportLine {
            depth,
            outcome: None,
            text: text.clone(),
        }));
        if let Some(nested) = &record.nested {
            push_report_lines(nested, depth + 1, lines);
        }
    }
}

/// Instructions of the run and of every nested run, parents first.
fn collect_instructions(report: &RunReport) -> Vec<&Instructions> {
    let mut all: Vec<&Instructions> = report.instructions.iter().collect();
    for nested in report.actions.iter().filter_map(|r| r.nested.as_deref()) {
        all.extend(collect_instructions(nested));
    }
    all
}

/// `3 succeeded, 1 skipped in 120ms`
fn summary_line(report: &RunReport) -> String {
    let counts = [
        (ActionOutcome::Succeeded, "succeeded"),
        (ActionOutcome::Failed, "failed"),
        (ActionOutcome::Skipped, "skipped"),
        (ActionOutcome::Invalid, "invalid"),
    ]
    .into_iter()
    .filter_map(|(outcome, name)| match report.count(outcome) {
        0 => None,
        n => Some(format!("{n} {name}")),
    })
    .collect::<Vec<_>>();

    let counts = if counts.is_empty() {
        "no actions".to_owned()
    } else {
        counts.join(", ")
    };
    format!(
        "{counts} in {}",
        format_elapsed(report.finished_at - report.started_at)
    )
}

fn format_elapsed(elapsed: TimeDelta) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    if millis < 1_000 {
        format!("{millis}ms")
    } else {
        format!("{:.1}s", millis as f64 / 1_000.0)
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use presetter_core::application::ActionRecord;
    use presetter_core::domain::ActionKind;

    fn make_manager(quiet: bool, no_color: bool, format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            log_file: None,
            output_format: format,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    fn record(index: usize, outcome: ActionOutcome) -> ActionRecord {
        ActionRecord {
            index,
            kind: ActionKind::Extract,
            title: None,
            outcome,
            output: Vec::new(),
            nested: None,
        }
    }

    fn nested_report() -> RunReport {
        let mut child = RunReport::empty("child");
        child.actions = vec![ActionRecord {
            output: vec!["nested".into()],
            ..record(0, ActionOutcome::Succeeded)
        }];
        child.instructions = Some(Instructions {
            heading: None,
            messages: vec!["Read the README".into()],
        });

        let mut parent = RunReport::empty("parent");
        parent.instructions = Some(Instructions {
            heading: Some("Next steps".into()),
            messages: vec!["Run the dev server".into()],
        });
        parent.actions = vec![
            ActionRecord {
                kind: ActionKind::Execute,
                output: vec!["done".into()],
                ..record(0, ActionOutcome::Succeeded)
            },
            ActionRecord {
                kind: ActionKind::Preset,
                title: Some("Apply child".into()),
                nested: Some(Box::new(child)),
                ..record(1, ActionOutcome::Succeeded)
            },
        ];
        parent
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.print("hello").is_ok());
        assert!(out.is_quiet());
    }

    #[test]
    fn plain_format_never_colours() {
        assert!(make_manager(false, false, OutputFormat::Plain).no_color);
        assert!(!make_manager(false, false, OutputFormat::Human).no_color);
        assert!(make_manager(false, true, OutputFormat::Human).no_color);
    }

    #[test]
    fn config_format_applies_when_flag_is_auto() {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: false,
            config: None,
            log_file: None,
            output_format: OutputFormat::Auto,
        };
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        assert_eq!(OutputManager::new(&args, &config).format(), OutputFormat::Json);
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut report = RunReport::empty("web");
        report.actions = vec![
            record(0, ActionOutcome::Succeeded),
            record(1, ActionOutcome::Succeeded),
            record(2, ActionOutcome::Skipped),
        ];
        assert_eq!(summary_line(&report), "2 succeeded, 1 skipped in 0ms");
    }

    #[test]
    fn empty_run_summary() {
        assert_eq!(summary_line(&RunReport::empty("web")), "no actions in 0ms");
    }

    #[test]
    fn elapsed_switches_to_seconds() {
        assert_eq!(format_elapsed(TimeDelta::milliseconds(1_500)), "1.5s");
        assert_eq!(format_elapsed(TimeDelta::milliseconds(12)), "12ms");
    }

    #[test]
    fn nested_runs_are_indented_under_their_action() {
        let line = |depth, outcome, text: &str| ReportLine {
            depth,
            outcome,
            text: text.into(),
        };

        assert_eq!(
            report_lines(&nested_report()),
            vec![
                line(0, Some(ActionOutcome::Succeeded), "execute"),
                line(0, None, "done"),
                line(0, Some(ActionOutcome::Succeeded), "Apply child (preset)"),
                line(1, Some(ActionOutcome::Succeeded), "extract"),
                line(1, None, "nested"),
            ]
        );
    }

    #[test]
    fn nested_instructions_follow_the_parent() {
        let report = nested_report();
        let messages: Vec<_> = collect_instructions(&report)
            .into_iter()
            .flat_map(|i| i.messages.clone())
            .collect();
        assert_eq!(messages, vec!["Run the dev server", "Read the README"]);
    }

    #[test]
    fn report_renders_in_plain_mode() {
        let mut report = RunReport::empty("web");
        report.actions = vec![record(0, ActionOutcome::Failed)];
        assert!(make_manager(false, true, OutputFormat::Plain).report(&report).is_ok());
    }
}
