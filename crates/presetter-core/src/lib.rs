//! Presetter Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Presetter, a
//! tool that applies composable presets (scaffolding scripts) to a project
//! directory.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          presetter-cli (CLI)            │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Applier + HandlerRegistry       │
//! │   (resolve, configure, dispatch, nest)  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Loader, Shell, Extractor, Installer,   │
//! │  Git, Filesystem)                       │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    presetter-adapters (Infrastructure)  │
//! └─────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Preset, Action, ContextValue, Groups)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use presetter_core::prelude::*;
//!
//! # fn demo(loader: Box<dyn PresetLoader>, registry: HandlerRegistry) -> PresetResult<()> {
//! let applier = Applier::new(loader, registry);
//! let report = applier.run(
//!     ApplierOptions::new("laravel", "./my-app").with_args(["--tailwind"]),
//! )?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! A preset script declares actions on a [`domain::Preset`]:
//!
//! ```rust
//! use presetter_core::domain::{ConflictStrategy, Preset};
//!
//! let mut preset = Preset::new();
//! preset.set_name("laravel");
//! preset.extract("*.php").when_conflict(ConflictStrategy::Skip);
//! preset
//!     .group(|p| {
//!         p.execute("npm").with_arguments(["install", "-D", "tailwindcss"]);
//!         p.extract("tailwind.config.js");
//!         Ok(())
//!     })
//!     .unwrap();
//! preset.apply("laravel:inertia").inherit_arguments(true);
//! assert_eq!(preset.actions().len(), 4);
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ActionOutcome, Applier, ApplierOptions, ApplierSettings, HandlerRegistry, RunReport,
        ports::{
            DependencyInstaller, ExtractRequest, Filesystem, GitOperations, LoadedPreset,
            PresetLoader, PresetScript, ShellExecutor, TemplateExtractor,
        },
    };
    pub use crate::domain::{
        Action, ActionKind, CommandLineOptions, ConflictStrategy, ContextValue, Ecosystem,
        InstallMode, Preset,
    };
    pub use crate::error::{PresetError, PresetResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
