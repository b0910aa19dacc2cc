//! Per-project virtual environment configuration.
//!
//! For every configured project directory carrying a `pyproject.toml`,
//! the dependency manager is pointed at an in-project virtual
//! environment bound to the pinned interpreter, and dependencies are
//! installed non-interactively. Each project stands alone: one failing
//! project never blocks the next.

use std::path::{Path, PathBuf};

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::{execute, CommandOptions};
use crate::tools::presence::is_executable;

/// Dependency manifest that marks a directory as a Poetry project.
const PROJECT_MANIFEST: &str = "pyproject.toml";

/// What happened to one project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    /// Environment configured and dependencies installed.
    Configured,

    /// Directory does not exist.
    MissingDirectory,

    /// Directory exists but has no dependency manifest.
    NoManifest,

    /// Configuration or install failed; the message says why.
    Failed(String),
}

/// Result of configuring one project.
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    pub path: PathBuf,
    pub status: ProjectStatus,
}

/// Configure every project, collecting one outcome per path.
pub fn configure_all(projects: &[PathBuf], env: &ExecEnv) -> Vec<ProjectOutcome> {
    projects
        .iter()
        .map(|path| {
            let status = configure_project(path, env);
            match &status {
                ProjectStatus::Configured => {
                    tracing::info!("Configured environment for {}", path.display());
                }
                ProjectStatus::MissingDirectory => {
                    tracing::info!("Skipping {}: directory does not exist", path.display());
                }
                ProjectStatus::NoManifest => {
                    tracing::info!("Skipping {}: no {}", path.display(), PROJECT_MANIFEST);
                }
                ProjectStatus::Failed(message) => {
                    tracing::warn!("Environment setup failed for {}: {}", path.display(), message);
                }
            }
            ProjectOutcome {
                path: path.clone(),
                status,
            }
        })
        .collect()
}

/// Configure a single project directory.
fn configure_project(path: &Path, env: &ExecEnv) -> ProjectStatus {
    if !path.is_dir() {
        return ProjectStatus::MissingDirectory;
    }
    if !path.join(PROJECT_MANIFEST).is_file() {
        return ProjectStatus::NoManifest;
    }

    match install_dependencies(path, env) {
        Ok(()) => ProjectStatus::Configured,
        Err(e) => ProjectStatus::Failed(e.to_string()),
    }
}

fn install_dependencies(path: &Path, env: &ExecEnv) -> Result<()> {
    let options = CommandOptions {
        cwd: Some(path.to_path_buf()),
        ..env.command_options()
    };

    run_poetry("poetry config virtualenvs.in-project true --local", &options)?;

    // Bind to the pinned interpreter; skip silently when the binary is
    // not (yet) executable.
    if let Some(interpreter) = &env.interpreter {
        if is_executable(interpreter) {
            run_poetry(
                &format!("poetry env use '{}'", interpreter.display()),
                &options,
            )?;
        }
    }

    run_poetry("poetry install --no-interaction --no-root", &options)
}

fn run_poetry(command: &str, options: &CommandOptions) -> Result<()> {
    let result = execute(command, options)?;
    if result.success {
        Ok(())
    } else {
        Err(CairnError::CommandFailed {
            command: command.to_string(),
            code: result.exit_code,
        })
    }
}
