//! Editor extension installation.
//!
//! Runs only when the editor's CLI is on the PATH model; a machine
//! without the editor skips the step without noise.

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::execute;
use crate::tools::Tool;

/// Extensions installed through the editor's CLI.
pub struct EditorExtensions {
    command: String,
    extensions: Vec<String>,
}

impl EditorExtensions {
    pub fn new(command: &str, extensions: &[String]) -> Self {
        Self {
            command: command.to_string(),
            extensions: extensions.to_vec(),
        }
    }

    /// Extensions already known to the editor, lowercased for comparison.
    fn installed_extensions(&self, env: &ExecEnv) -> Vec<String> {
        let command = format!("{} --list-extensions", self.command);
        match execute(&command, &env.command_options()) {
            Ok(result) if result.success => result
                .stdout
                .lines()
                .map(|l| l.trim().to_lowercase())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Tool for EditorExtensions {
    fn name(&self) -> &str {
        "editor-extensions"
    }

    fn is_present(&self, env: &ExecEnv) -> bool {
        if self.extensions.is_empty() {
            return true;
        }

        // No editor CLI means nothing to do; report satisfied so the
        // sequence skips rather than attempts an install.
        if env.lookup(&self.command).is_none() {
            return true;
        }

        let installed = self.installed_extensions(env);
        self.extensions
            .iter()
            .all(|ext| installed.contains(&ext.to_lowercase()))
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        for extension in &self.extensions {
            let command = format!("{} --install-extension {}", self.command, extension);
            tracing::info!("Installing editor extension {}", extension);
            let result = execute(&command, &env.command_options())?;
            if !result.success {
                return Err(CairnError::CommandFailed {
                    command,
                    code: result.exit_code,
                });
            }
        }
        Ok(())
    }

    fn version_string(&self, env: &ExecEnv) -> Option<String> {
        let result = execute(
            &format!("{} --version", self.command),
            &env.command_options(),
        )
        .ok()?;
        if result.success {
            result.stdout.lines().next().map(|l| l.trim().to_string())
        } else {
            None
        }
    }
}
