//! Poetry installation pinned to a configured version.
//!
//! The presence check compares the installed version against the pin, so
//! a version drift reinstalls rather than silently keeping the old
//! binary. The force-latest escape hatch accepts whatever is installed
//! and lets the installer's default channel decide on fresh installs.

use regex::Regex;

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::execute;
use crate::tools::fetch::{fetch_and_run, ScriptFetcher};
use crate::tools::Tool;

/// Default installer endpoint.
const INSTALLER_URL: &str = "https://install.python-poetry.org";

/// The Poetry dependency manager at a pinned version.
pub struct Poetry {
    version: String,
    force_latest: bool,
    installer_url: String,
}

impl Poetry {
    pub fn new(version: &str, force_latest: bool) -> Self {
        Self {
            version: version.to_string(),
            force_latest,
            installer_url: INSTALLER_URL.to_string(),
        }
    }

    /// Override the installer URL (tests).
    pub fn with_installer_url(mut self, url: &str) -> Self {
        self.installer_url = url.to_string();
        self
    }

    /// Extract a `MAJOR.MINOR.PATCH` version from `poetry --version` output.
    pub fn extract_version(output: &str) -> Option<String> {
        let re = Regex::new(r"(\d+\.\d+\.\d+)").expect("static regex must compile");
        re.captures(output)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn installed_version(&self, env: &ExecEnv) -> Option<String> {
        let result = execute("poetry --version", &env.command_options()).ok()?;
        if result.success {
            Self::extract_version(&result.stdout)
        } else {
            None
        }
    }
}

impl Tool for Poetry {
    fn name(&self) -> &str {
        "poetry"
    }

    fn is_present(&self, env: &ExecEnv) -> bool {
        match self.installed_version(env) {
            Some(installed) => self.force_latest || installed == self.version,
            None => false,
        }
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        if self.force_latest {
            tracing::info!("Installing Poetry (latest)");
        } else {
            tracing::info!("Installing Poetry {}", self.version);
            env.set_var("POETRY_VERSION", &self.version);
        }

        // Poetry lands in ~/.local/bin; later steps need it on the model.
        let local_bin = env.home.join(".local").join("bin");
        env.prepend_path(&local_bin);

        let fetcher = ScriptFetcher::new();
        let result = fetch_and_run(&fetcher, "poetry", &self.installer_url, &[], env)?;
        if !result.success {
            return Err(CairnError::CommandFailed {
                command: format!("poetry installer ({})", self.installer_url),
                code: result.exit_code,
            });
        }

        Ok(())
    }

    fn version_string(&self, env: &ExecEnv) -> Option<String> {
        let result = execute("poetry --version", &env.command_options()).ok()?;
        if result.success {
            Some(result.stdout.trim().to_string())
        } else {
            None
        }
    }
}
