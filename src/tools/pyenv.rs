//! pyenv installation, activation, and interpreter pinning.
//!
//! Activation happens on every run: the profile lines are appended
//! idempotently, and the PATH model gains the `bin` and `shims`
//! directories so every later step (Poetry, project environments) sees
//! pyenv without a shell restart.

use std::path::{Path, PathBuf};

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::{execute, profile::append_to_profiles};
use crate::tools::fetch::{fetch_and_run, ScriptFetcher};
use crate::tools::Tool;

/// Default installer endpoint.
const INSTALLER_URL: &str = "https://pyenv.run";

/// The pyenv version manager plus the pinned interpreter.
pub struct Pyenv {
    root: PathBuf,
    version: String,
    installer_url: String,
}

impl Pyenv {
    pub fn new(root: PathBuf, version: &str) -> Self {
        Self {
            root,
            version: version.to_string(),
            installer_url: INSTALLER_URL.to_string(),
        }
    }

    /// Override the installer URL (tests).
    pub fn with_installer_url(mut self, url: &str) -> Self {
        self.installer_url = url.to_string();
        self
    }

    /// The pyenv binary inside the root.
    pub fn binary(&self) -> PathBuf {
        self.root.join("bin").join("pyenv")
    }

    /// The pinned interpreter binary for the configured version.
    pub fn interpreter(&self) -> PathBuf {
        self.root
            .join("versions")
            .join(&self.version)
            .join("bin")
            .join("python3")
    }

    /// Whether the pinned interpreter version is installed.
    fn version_installed(&self) -> bool {
        self.root.join("versions").join(&self.version).is_dir()
    }

    /// Profile lines that activate pyenv in future shells.
    fn profile_lines(&self, home: &Path) -> Vec<String> {
        let root_line = if self.root == home.join(".pyenv") {
            "export PYENV_ROOT=\"$HOME/.pyenv\"".to_string()
        } else {
            format!("export PYENV_ROOT=\"{}\"", self.root.display())
        };
        vec![
            root_line,
            "export PATH=\"$PYENV_ROOT/bin:$PATH\"".to_string(),
            "eval \"$(pyenv init -)\"".to_string(),
        ]
    }

    /// Activate pyenv for this run and future shells.
    ///
    /// Appends the activation lines to the profile files, extends the
    /// PATH model with `bin` and `shims`, exports `PYENV_ROOT` to child
    /// commands, and records the pinned interpreter path. Idempotent.
    pub fn activate(&self, env: &mut ExecEnv) -> Result<()> {
        for line in self.profile_lines(&env.home) {
            append_to_profiles(&env.home, &line)?;
        }

        env.prepend_path(&self.root.join("shims"));
        env.prepend_path(&self.root.join("bin"));
        env.set_var("PYENV_ROOT", &self.root.to_string_lossy());
        env.interpreter = Some(self.interpreter());

        Ok(())
    }
}

impl Tool for Pyenv {
    fn name(&self) -> &str {
        "pyenv"
    }

    fn is_present(&self, _env: &ExecEnv) -> bool {
        self.binary().is_file() && self.version_installed()
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        if !self.binary().is_file() {
            tracing::info!("Installing pyenv into {}", self.root.display());
            let fetcher = ScriptFetcher::new();
            let result = fetch_and_run(&fetcher, "pyenv", &self.installer_url, &[], env)?;
            if !result.success {
                return Err(CairnError::CommandFailed {
                    command: format!("pyenv installer ({})", self.installer_url),
                    code: result.exit_code,
                });
            }
        }

        if !self.version_installed() {
            tracing::info!("Installing Python {} via pyenv", self.version);
            let command = format!("pyenv install -s {}", self.version);
            let result = execute(&command, &env.command_options())?;
            if !result.success {
                return Err(CairnError::CommandFailed {
                    command,
                    code: result.exit_code,
                });
            }
        }

        let command = format!("pyenv global {}", self.version);
        let result = execute(&command, &env.command_options())?;
        if !result.success {
            return Err(CairnError::CommandFailed {
                command,
                code: result.exit_code,
            });
        }

        Ok(())
    }

    fn version_string(&self, env: &ExecEnv) -> Option<String> {
        let result = execute("pyenv --version", &env.command_options()).ok()?;
        if result.success {
            result.stdout.lines().next().map(|l| l.trim().to_string())
        } else {
            None
        }
    }
}
