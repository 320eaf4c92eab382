//! Dependency installation through the ecosystem's package manager.

use std::path::Path;
use std::sync::Arc;

use presetter_core::{
    application::{
        ApplicationError,
        ports::{DependencyInstaller, Filesystem, ShellExecutor},
    },
    domain::{Ecosystem, InstallMode},
    error::{PresetError, PresetResult},
};
use tracing::{debug, info, instrument};

/// Node package manager for `target`, chosen from its lock file.
pub fn node_package_manager(filesystem: &dyn Filesystem, target: &Path) -> &'static str {
    if filesystem.exists(&target.join("pnpm-lock.yaml")) {
        "pnpm"
    } else if filesystem.exists(&target.join("yarn.lock")) {
        "yarn"
    } else {
        "npm"
    }
}

/// Installs dependencies by running `npm`/`yarn`/`pnpm` or `composer`.
pub struct PackageManagerInstaller {
    shell: Arc<dyn ShellExecutor>,
    filesystem: Arc<dyn Filesystem>,
}

impl PackageManagerInstaller {
    pub fn new(shell: Arc<dyn ShellExecutor>, filesystem: Arc<dyn Filesystem>) -> Self {
        Self { shell, filesystem }
    }

    fn command(&self, ecosystem: Ecosystem, mode: InstallMode, target: &Path) -> (&'static str, &'static str) {
        match (ecosystem, mode) {
            (Ecosystem::Php, InstallMode::Install) => ("composer", "install"),
            (Ecosystem::Php, InstallMode::Update) => ("composer", "update"),
            (Ecosystem::Node, mode) => {
                let manager = node_package_manager(self.filesystem.as_ref(), target);
                let subcommand = match (manager, mode) {
                    (_, InstallMode::Install) => "install",
                    ("yarn", InstallMode::Update) => "upgrade",
                    (_, InstallMode::Update) => "update",
                };
                (manager, subcommand)
            }
        }
    }
}

impl DependencyInstaller for PackageManagerInstaller {
    #[instrument(skip(self), fields(target = %target.display()))]
    fn install(&self, ecosystem: Ecosystem, mode: InstallMode, target: &Path) -> PresetResult<()> {
        let (program, subcommand) = self.command(ecosystem, mode, target);
        info!("Running {program} {subcommand}");

        let lines = self
            .shell
            .execute(program, &[subcommand.to_owned()], target)
            .map_err(|e| install_failed(ecosystem, e))?;
        for line in lines {
            debug!(%program, "{line}");
        }
        Ok(())
    }
}

fn install_failed(ecosystem: Ecosystem, error: PresetError) -> PresetError {
    ApplicationError::InstallFailed {
        ecosystem: ecosystem.to_string(),
        reason: error.to_string(),
    }
    .into()
}
