//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `presetter-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `PresetLoader`: preset resolution
//!   - `ShellExecutor`: command execution
//!   - `TemplateExtractor`: template copying
//!   - `DependencyInstaller`: package managers
//!   - `GitOperations`: git metadata
//!   - `Filesystem`: file operations
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - `PresetRunner` (implemented by `Applier`)

pub mod output;

pub use output::{
    DependencyInstaller, ExtractRequest, Filesystem, GitOperations, LoadedPreset, PresetLoader,
    PresetScript, ShellExecutor, TemplateExtractor,
};

#[cfg(test)]
pub use output::{
    MockDependencyInstaller, MockGitOperations, MockPresetLoader, MockShellExecutor,
    MockTemplateExtractor,
};
