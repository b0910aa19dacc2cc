//! Node.js runtime and global npm packages.
//!
//! Entirely best-effort: a machine that cannot install Node still gets
//! everything else, and the failure is visible in the run summary.

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::execute;
use crate::tools::apt::sudo_prefix;
use crate::tools::Tool;

/// The Node.js runtime plus configured global CLI packages.
pub struct NodeRuntime {
    globals: Vec<String>,
}

impl NodeRuntime {
    pub fn new(globals: &[String]) -> Self {
        Self {
            globals: globals.to_vec(),
        }
    }
}

impl Tool for NodeRuntime {
    fn name(&self) -> &str {
        "node"
    }

    fn is_present(&self, env: &ExecEnv) -> bool {
        // Globals are approximated by their command names, which holds
        // for the CLI tools this step is for.
        env.lookup("node").is_some() && self.globals.iter().all(|g| env.lookup(g).is_some())
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        if env.lookup("node").is_none() {
            tracing::info!("Installing Node.js runtime");
            let command = format!("{}apt-get install -y nodejs npm", sudo_prefix(env));
            let result = execute(&command, &env.command_options())?;
            if !result.success {
                return Err(CairnError::CommandFailed {
                    command,
                    code: result.exit_code,
                });
            }
        }

        if self.globals.is_empty() {
            return Ok(());
        }

        tracing::info!("Installing global npm packages: {}", self.globals.join(", "));
        let command = format!(
            "{}npm install -g {}",
            sudo_prefix(env),
            self.globals.join(" ")
        );
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
        let result = execute("node --version", &env.command_options()).ok()?;
        if result.success {
            Some(result.stdout.trim().to_string())
        } else {
            None
        }
    }
}
