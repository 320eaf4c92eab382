//! Applier - resolves a preset, runs its script, and performs its actions.
//!
//! The workflow for one run:
//! 1. Resolve the preset through the [`PresetLoader`]
//! 2. Bind run state (target, options, args, git) onto a fresh [`Preset`]
//! 3. Let the preset script declare its actions
//! 4. Dispatch every action, in declaration order, to its handler
//!
//! Nested presets re-enter [`Applier::run`] through the [`PresetRunner`] port
//! with an incremented depth.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::ApplicationError;
use crate::application::handlers::{HandlerRegistry, PresetRunner, RunContext};
use crate::application::ports::{GitOperations, PresetLoader};
use crate::domain::{
    ActionKind, CommandLineOptions, DomainError, GitContext, Instructions, Preset, RunBinding,
};
use crate::error::PresetResult;

/// How deep presets may nest by default.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Input of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplierOptions {
    /// Preset reference: a name, a path, or a repository.
    pub resolvable: String,
    /// Directory the preset is applied to.
    pub target: PathBuf,
    pub options: CommandLineOptions,
    /// Arguments forwarded to the preset (`presetter apply x -- args`).
    pub args: Vec<String>,
    /// 0 for the top-level run.
    pub depth: usize,
}

impl ApplierOptions {
    pub fn new(resolvable: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            resolvable: resolvable.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: CommandLineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplierSettings {
    pub max_depth: usize,
}

impl Default for ApplierSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What happened to one declared action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionOutcome {
    Succeeded,
    /// The handler reported a contained failure.
    Failed,
    /// A condition resolved to `false`.
    Skipped,
    /// The handler rejected the resolved fields.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub index: usize,
    pub kind: ActionKind,
    pub title: Option<String>,
    pub outcome: ActionOutcome,
    /// Lines captured from commands run by this action.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
    /// Report of the preset applied by this action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<RunReport>>,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub id: Uuid,
    pub preset: String,
    pub target: PathBuf,
    pub depth: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub actions: Vec<ActionRecord>,
    pub instructions: Option<Instructions>,
}

impl RunReport {
    /// A report for a run that declared no actions.
    pub fn empty(preset: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            preset: preset.into(),
            target: PathBuf::new(),
            depth: 0,
            started_at: now,
            finished_at: now,
            actions: Vec::new(),
            instructions: None,
        }
    }

    /// `true` unless an action reported a failure.
    pub fn is_success(&self) -> bool {
        !self
            .actions
            .iter()
            .any(|a| a.outcome == ActionOutcome::Failed)
    }

    pub fn count(&self, outcome: ActionOutcome) -> usize {
        self.actions.iter().filter(|a| a.outcome == outcome).count()
    }

    pub fn outcomes(&self) -> Vec<ActionOutcome> {
        self.actions.iter().map(|a| a.outcome).collect()
    }
}

/// Applies presets.
///
/// Owns the loader and the handler registry; both are fixed at construction.
pub struct Applier {
    loader: Box<dyn PresetLoader>,
    registry: HandlerRegistry,
    git: Option<Arc<dyn GitOperations>>,
    settings: ApplierSettings,
}

impl Applier {
    pub fn new(loader: Box<dyn PresetLoader>, registry: HandlerRegistry) -> Self {
        Self {
            loader,
            registry,
            git: None,
            settings: ApplierSettings::default(),
        }
    }

    /// Expose git metadata to presets.
    pub fn with_git(mut self, git: Arc<dyn GitOperations>) -> Self {
        self.git = Some(git);
        self
    }

    pub fn with_settings(mut self, settings: ApplierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> ApplierSettings {
        self.settings
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Apply the preset named by `options.resolvable` to `options.target`.
    #[instrument(
        skip_all,
        fields(
            preset = %options.resolvable,
            target = %options.target.display(),
            depth = options.depth
        )
    )]
    pub fn run(&self, options: ApplierOptions) -> PresetResult<RunReport> {
        let started_at = Utc::now();

        if options.resolvable.trim().is_empty() {
            return Err(DomainError::EmptyResolvable.into());
        }
        if options.depth > self.settings.max_depth {
            return Err(ApplicationError::RecursionLimit {
                resolvable: options.resolvable,
                max_depth: self.settings.max_depth,
            }
            .into());
        }

        let loaded = self.loader.load(&options.resolvable, &options.options)?;
        debug!(directory = %loaded.directory.display(), "Preset resolved");

        let mut preset = Preset::bound(RunBinding {
            target_directory: options.target.clone(),
            preset_directory: loaded.directory.clone(),
            options: options.options.clone(),
            args: options.args.clone(),
            git: self.git_context(),
        });
        if let Some(name) = loaded.script.name() {
            preset.set_name(name);
        }
        loaded.script.configure(&mut preset)?;

        info!(
            actions = preset.actions().len(),
            "Applying {}",
            preset.name().unwrap_or(&options.resolvable)
        );

        let context = RunContext {
            target_directory: options.target.clone(),
            argv: options.args,
            template_root: preset.template_root(),
            options: options.options,
            depth: options.depth,
        };
        let actions = self.perform_actions(&preset, &context)?;

        Ok(RunReport {
            id: Uuid::new_v4(),
            preset: preset
                .name()
                .map_or_else(|| options.resolvable.clone(), str::to_owned),
            target: options.target,
            depth: options.depth,
            started_at,
            finished_at: Utc::now(),
            actions,
            instructions: preset.instructions().cloned(),
        })
    }

    /// Dispatch the actions of `preset` in declaration order.
    ///
    /// Stops at the first handler error.
    pub fn perform_actions(
        &self,
        preset: &Preset,
        context: &RunContext,
    ) -> PresetResult<Vec<ActionRecord>> {
        let mut records = Vec::with_capacity(preset.actions().len());

        for (index, action) in preset.actions().iter().enumerate() {
            let kind = action.kind();
            let record = |title: Option<String>, outcome| ActionRecord {
                index,
                kind,
                title,
                outcome,
                output: Vec::new(),
                nested: None,
            };

            if !action.conditions_hold(preset) {
                debug!(index, %kind, "Conditions not met, skipping");
                records.push(record(None, ActionOutcome::Skipped));
                continue;
            }

            let handler = self
                .registry
                .get(kind)
                .ok_or(ApplicationError::HandlerMissing { kind })?;

            let title = action.resolve_title(preset);
            let Some(validated) = handler.validate(action.resolve(preset)) else {
                debug!(index, %kind, "Invalid action, skipping");
                records.push(record(title, ActionOutcome::Invalid));
                continue;
            };

            match &title {
                Some(title) => info!("{title}"),
                None => debug!(index, %kind, "Performing action"),
            }

            let handled = handler.handle(validated, context, self)?;
            let outcome = if handled.success {
                ActionOutcome::Succeeded
            } else {
                ActionOutcome::Failed
            };
            records.push(ActionRecord {
                output: handled.output,
                nested: handled.nested,
                ..record(title, outcome)
            });
        }

        Ok(records)
    }

    fn git_context(&self) -> GitContext {
        let Some(git) = &self.git else {
            return GitContext::default();
        };

        let config = git.config_snapshot().unwrap_or_else(|error| {
            debug!(%error, "Git configuration unavailable");
            Default::default()
        });
        GitContext::new(config, Some(Arc::clone(git)))
    }
}

impl PresetRunner for Applier {
    fn run(&self, options: ApplierOptions) -> PresetResult<RunReport> {
        Applier::run(self, options)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::application::ports::{
        DependencyInstaller, ExtractRequest, LoadedPreset, MockGitOperations, PresetScript,
        ShellExecutor, TemplateExtractor,
    };
    use crate::domain::{Ecosystem, InstallMode};
    use crate::error::PresetError;

    // ── Fakes ─────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct StaticLoader {
        presets: HashMap<String, Arc<dyn PresetScript>>,
    }

    impl StaticLoader {
        fn with(
            mut self,
            name: &str,
            script: impl Fn(&mut Preset) -> PresetResult<()> + Send + Sync + 'static,
        ) -> Self {
            self.presets.insert(name.to_owned(), Arc::new(script));
            self
        }
    }

    impl PresetLoader for StaticLoader {
        fn load(&self, resolvable: &str, _: &CommandLineOptions) -> PresetResult<LoadedPreset> {
            self.presets
                .get(resolvable)
                .map(|script| {
                    LoadedPreset::new(Arc::clone(script), format!("/presets/{resolvable}"))
                })
                .ok_or_else(|| {
                    ApplicationError::PresetResolution {
                        resolvable: resolvable.to_owned(),
                        reason: "unknown preset".into(),
                    }
                    .into()
                })
        }
    }

    /// Records every side effect, in order.
    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ShellExecutor for Journal {
        fn execute(&self, command: &str, args: &[String], _: &Path) -> PresetResult<Vec<String>> {
            if command == "fail" {
                return Err(ApplicationError::CommandFailed {
                    command: command.into(),
                    reason: "exit status 1".into(),
                }
                .into());
            }
            self.push(format!("execute:{command}:{}", args.join(" ")));
            match command {
                "echo" => Ok(vec![args.join(" ")]),
                _ => Ok(vec![]),
            }
        }
    }

    impl TemplateExtractor for Journal {
        fn extract(&self, request: &ExtractRequest) -> PresetResult<Vec<PathBuf>> {
            self.push(format!(
                "extract:{}:{}",
                request.template_root.display(),
                request.inputs.join(",")
            ));
            Ok(vec![])
        }
    }

    impl DependencyInstaller for Journal {
        fn install(&self, ecosystem: Ecosystem, mode: InstallMode, _: &Path) -> PresetResult<()> {
            self.push(format!("dependencies:{ecosystem}:{mode:?}"));
            Ok(())
        }
    }

    fn applier(loader: StaticLoader, journal: &Journal) -> Applier {
        let registry = HandlerRegistry::standard(
            Arc::new(journal.clone()),
            Arc::new(journal.clone()),
            Arc::new(journal.clone()),
        );
        Applier::new(Box::new(loader), registry)
    }

    fn run(applier: &Applier, resolvable: &str) -> PresetResult<RunReport> {
        applier.run(ApplierOptions::new(resolvable, "/work/app"))
    }

    // ── Tests ─────────────────────────────────────────────────────────────

    #[test]
    fn actions_run_depth_first_in_declaration_order() {
        let journal = Journal::default();
        let loader = StaticLoader::default()
            .with("parent", |p| {
                p.extract("*.php");
                p.execute("echo").with_arguments("parent");
                p.apply("child");
                p.install_dependencies();
                Ok(())
            })
            .with("child", |p| {
                p.execute("echo").with_arguments("child");
                Ok(())
            });

        let report = run(&applier(loader, &journal), "parent").unwrap();

        assert_eq!(
            journal.entries(),
            vec![
                "extract:/presets/parent/templates:*.php",
                "execute:echo:parent",
                "execute:echo:child",
                "dependencies:node:Install",
            ]
        );
        assert_eq!(report.count(ActionOutcome::Succeeded), 4);
        assert!(report.is_success());
    }

    #[test]
    fn report_keeps_output_and_nested_runs_in_declared_order() {
        let journal = Journal::default();
        let loader = StaticLoader::default()
            .with("starter", |p| {
                p.extract("*.php");
                p.execute("echo").with_arguments("done");
                p.apply("other:preset");
                Ok(())
            })
            .with("other:preset", |p| {
                p.extract("README.md");
                p.execute("echo").with_arguments("nested");
                p.instruct(["Read the README"]);
                Ok(())
            });

        let report = run(&applier(loader, &journal), "starter").unwrap();

        assert_eq!(
            journal.entries(),
            vec![
                "extract:/presets/starter/templates:*.php",
                "execute:echo:done",
                "extract:/presets/other:preset/templates:README.md",
                "execute:echo:nested",
            ]
        );
        assert!(report.actions[0].output.is_empty());
        assert_eq!(report.actions[1].output, vec!["done"]);

        let nested = report.actions[2].nested.as_deref().unwrap();
        assert_eq!(nested.depth, 1);
        assert_eq!(
            nested.outcomes(),
            vec![ActionOutcome::Succeeded, ActionOutcome::Succeeded]
        );
        assert_eq!(nested.actions[1].output, vec!["nested"]);
        assert_eq!(
            nested.instructions.as_ref().map(|i| i.messages.clone()),
            Some(vec!["Read the README".to_string()])
        );
    }

    #[test]
    fn inherited_arguments_follow_own_arguments() {
        let journal = Journal::default();
        let loader = StaticLoader::default()
            .with("inheriting", |p| {
                p.apply("child").with_arguments("--foo").inherit_arguments(true);
                Ok(())
            })
            .with("isolated", |p| {
                p.apply("child").with_arguments("--foo");
                Ok(())
            })
            .with("child", |p| {
                p.execute("echo")
                    .with_arguments(|p: &Preset| p.args().to_vec());
                Ok(())
            });
        let applier = applier(loader, &journal);

        for (preset, expected) in [
            ("inheriting", "execute:echo:--foo --bar"),
            ("isolated", "execute:echo:--foo"),
        ] {
            applier
                .run(ApplierOptions::new(preset, "/work/app").with_args(["--bar"]))
                .unwrap();
            assert_eq!(journal.entries().last().map(String::as_str), Some(expected));
        }
    }

    #[test]
    fn nested_failure_is_contained() {
        let journal = Journal::default();
        let loader = StaticLoader::default()
            .with("parent", |p| {
                p.apply("missing");
                p.apply("broken");
                p.execute("echo").with_arguments("after");
                Ok(())
            })
            .with("broken", |p| {
                p.execute("fail");
                p.execute("echo").with_arguments("unreachable");
                Ok(())
            });

        let report = run(&applier(loader, &journal), "parent").unwrap();

        assert_eq!(
            report.outcomes(),
            vec![
                ActionOutcome::Failed,
                ActionOutcome::Failed,
                ActionOutcome::Succeeded
            ]
        );
        assert_eq!(journal.entries(), vec!["execute:echo:after"]);
        assert!(!report.is_success());
    }

    #[test]
    fn handler_error_terminates_top_level_run() {
        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            p.execute("fail");
            p.execute("echo");
            Ok(())
        });

        let result = run(&applier(loader, &journal), "parent");

        assert!(matches!(
            result,
            Err(PresetError::Application(ApplicationError::CommandFailed { .. }))
        ));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn false_condition_skips_without_touching_handler() {
        let journal = Journal::default();
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluations);
        let loader = StaticLoader::default().with("parent", move |p| {
            let counter = Arc::clone(&counter);
            p.execute(move |_: &Preset| {
                counter.fetch_add(1, Ordering::SeqCst);
                vec!["echo".to_string()]
            })
            .when(false);
            p.execute("echo").with_arguments("kept");
            Ok(())
        });

        let report = run(&applier(loader, &journal), "parent").unwrap();

        assert_eq!(evaluations.load(Ordering::SeqCst), 0);
        assert_eq!(
            report.outcomes(),
            vec![ActionOutcome::Skipped, ActionOutcome::Succeeded]
        );
        assert_eq!(journal.entries(), vec!["execute:echo:kept"]);
    }

    #[test]
    fn group_conditions_gate_every_member() {
        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            p.pending_group()
                .when(|p: &Preset| p.options().is_enabled("docker"))
                .commit(|p| {
                    p.execute("docker");
                    p.extract("Dockerfile");
                    Ok(())
                })?;
            p.execute("echo");
            Ok(())
        });
        let applier = applier(loader, &journal);

        run(&applier, "parent").unwrap();
        assert_eq!(journal.entries(), vec!["execute:echo:"]);

        let mut options = CommandLineOptions::default();
        options.set("docker", true.into());
        applier
            .run(ApplierOptions::new("parent", "/work/app").with_options(options))
            .unwrap();
        assert_eq!(journal.entries().len(), 4);
    }

    #[test]
    fn invalid_action_is_recorded_and_skipped() {
        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            p.apply("").with_title("Nothing to apply");
            p.execute(Vec::<String>::new());
            Ok(())
        });

        let report = run(&applier(loader, &journal), "parent").unwrap();

        assert_eq!(
            report.outcomes(),
            vec![ActionOutcome::Invalid, ActionOutcome::Invalid]
        );
        assert_eq!(report.actions[0].title.as_deref(), Some("Nothing to apply"));
        assert!(report.is_success());
    }

    #[test]
    fn recursion_stops_at_max_depth() {
        let journal = Journal::default();
        let loader = StaticLoader::default().with("loop", |p| {
            p.execute("tick");
            p.apply("loop");
            Ok(())
        });
        let applier = applier(loader, &journal).with_settings(ApplierSettings { max_depth: 3 });

        let report = run(&applier, "loop").unwrap();

        // Depths 0 through 3 run; depth 4 is refused and contained.
        assert_eq!(journal.entries().len(), 4);
        assert_eq!(report.actions[1].outcome, ActionOutcome::Failed);
    }

    #[test]
    fn refuses_depth_beyond_limit() {
        let journal = Journal::default();
        let applier = applier(StaticLoader::default(), &journal);
        let options = ApplierOptions {
            depth: DEFAULT_MAX_DEPTH + 1,
            ..ApplierOptions::new("anything", "/work/app")
        };

        assert!(matches!(
            applier.run(options),
            Err(PresetError::Application(ApplicationError::RecursionLimit { max_depth: 16, .. }))
        ));
    }

    #[test]
    fn empty_resolvable_is_rejected() {
        let journal = Journal::default();
        let applier = applier(StaticLoader::default(), &journal);

        assert!(matches!(
            run(&applier, " "),
            Err(PresetError::Domain(DomainError::EmptyResolvable))
        ));
    }

    #[test]
    fn unresolvable_top_level_preset_is_an_error() {
        let journal = Journal::default();
        let applier = applier(StaticLoader::default(), &journal);

        assert!(matches!(
            run(&applier, "nope"),
            Err(PresetError::Application(ApplicationError::PresetResolution { .. }))
        ));
    }

    #[test]
    fn missing_handler_is_an_error() {
        let loader = StaticLoader::default().with("parent", |p| {
            p.execute("echo");
            Ok(())
        });
        let applier = Applier::new(Box::new(loader), HandlerRegistry::new());

        assert!(matches!(
            run(&applier, "parent"),
            Err(PresetError::Application(ApplicationError::HandlerMissing {
                kind: ActionKind::Execute
            }))
        ));
    }

    #[test]
    fn report_carries_name_and_instructions() {
        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            p.set_name("Laravel");
            p.instruct(["Run php artisan serve"]).with_heading("Next steps");
            Ok(())
        });

        let report = run(&applier(loader, &journal), "parent").unwrap();

        assert_eq!(report.preset, "Laravel");
        assert_eq!(report.target, PathBuf::from("/work/app"));
        let instructions = report.instructions.unwrap();
        assert_eq!(instructions.heading.as_deref(), Some("Next steps"));
        assert_eq!(instructions.messages, vec!["Run php artisan serve"]);
    }

    #[test]
    fn git_snapshot_is_bound_before_the_script_runs() {
        let mut git = MockGitOperations::new();
        git.expect_config_snapshot().returning(|| {
            Ok(BTreeMap::from([("user.name".to_string(), "Ada".to_string())]))
        });

        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            let author = p.git().config_value("user.name").unwrap_or("nobody").to_owned();
            p.execute("echo").with_arguments(author);
            Ok(())
        });
        let applier = applier(loader, &journal).with_git(Arc::new(git));

        run(&applier, "parent").unwrap();
        assert_eq!(journal.entries(), vec!["execute:echo:Ada"]);
    }

    #[test]
    fn git_failure_leaves_empty_config() {
        let mut git = MockGitOperations::new();
        git.expect_config_snapshot().returning(|| {
            Err(ApplicationError::GitError {
                reason: "git not installed".into(),
            }
            .into())
        });

        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            assert!(p.git().config.is_empty());
            Ok(())
        });
        let applier = applier(loader, &journal).with_git(Arc::new(git));

        assert!(run(&applier, "parent").is_ok());
    }

    #[test]
    fn script_option_defaults_do_not_override_run_options() {
        let journal = Journal::default();
        let loader = StaticLoader::default().with("parent", |p| {
            p.option("ssh", false).option("docker", true);
            p.execute("echo").with_arguments(|p: &Preset| {
                vec![
                    p.options().is_enabled("ssh").to_string(),
                    p.options().is_enabled("docker").to_string(),
                ]
            });
            Ok(())
        });
        let options = CommandLineOptions {
            ssh: Some(true),
            ..Default::default()
        };

        applier(loader, &journal)
            .run(ApplierOptions::new("parent", "/work/app").with_options(options))
            .unwrap();
        assert_eq!(journal.entries(), vec!["execute:echo:true true"]);
    }
}
