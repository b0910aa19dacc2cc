//! OS package installation.
//!
//! The system package step is the one critical step in the sequence: a
//! machine without its base libraries cannot build interpreters or R
//! packages, so a failure here aborts provisioning.

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::{execute, execute_check, execute_quiet};
use crate::tools::Tool;

/// The fixed list of OS packages, installed in one invocation.
pub struct SystemPackages {
    packages: Vec<String>,
}

impl SystemPackages {
    pub fn new(packages: &[String]) -> Self {
        Self {
            packages: packages.to_vec(),
        }
    }
}

impl Tool for SystemPackages {
    fn name(&self) -> &str {
        "system-packages"
    }

    fn is_present(&self, env: &ExecEnv) -> bool {
        !self.packages.is_empty()
            && self
                .packages
                .iter()
                .all(|pkg| package_installed(pkg, env))
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        if self.packages.is_empty() {
            return Ok(());
        }

        let command = format!(
            "{}apt-get install -y {}",
            sudo_prefix(env),
            self.packages.join(" ")
        );
        tracing::info!("Installing OS packages: {}", self.packages.join(", "));

        let result = execute(&command, &env.command_options())?;
        if result.success {
            Ok(())
        } else {
            Err(CairnError::CommandFailed {
                command,
                code: result.exit_code,
            })
        }
    }

    fn version_string(&self, env: &ExecEnv) -> Option<String> {
        let result = execute("apt-get --version", &env.command_options()).ok()?;
        if result.success {
            result.stdout.lines().next().map(|l| l.trim().to_string())
        } else {
            None
        }
    }
}

/// Check whether a single package is installed according to dpkg.
fn package_installed(package: &str, env: &ExecEnv) -> bool {
    execute_check(
        &format!("dpkg -s {} >/dev/null 2>&1", package),
        &env.command_options(),
    )
}

/// Prefix package-manager commands with sudo when not running as root.
pub(crate) fn sudo_prefix(env: &ExecEnv) -> &'static str {
    if is_root() || env.lookup("sudo").is_none() {
        ""
    } else {
        "sudo "
    }
}

fn is_root() -> bool {
    execute_quiet("id -u", None)
        .map(|r| r.success && r.stdout.trim() == "0")
        .unwrap_or(false)
}
