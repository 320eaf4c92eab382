//! Adapters that drive external programs: shell commands, package managers,
//! and git.

mod git;
mod installer;
mod shell;

pub use git::GitCli;
pub use installer::{PackageManagerInstaller, node_package_manager};
pub use shell::{CommandShellExecutor, ProcessError};
