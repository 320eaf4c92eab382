//! Infrastructure adapters for Presetter.
//!
//! This crate implements the ports defined in `presetter-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod extractor;
pub mod filesystem;
pub mod loader;
pub mod process;

// Re-export commonly used adapters
pub use extractor::FilesystemExtractor;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use loader::{ChainLoader, ManifestLoader, PresetRegistry};
pub use process::{CommandShellExecutor, GitCli, PackageManagerInstaller};
