//! Installer script fetching and execution.
//!
//! Third-party tools (pyenv, Poetry, the vendor CLI) ship `curl | sh`
//! installers. Cairn downloads the script, writes it to a private temp
//! file, and runs it through the shell against the step's [`ExecEnv`],
//! so the PATH the installer sees is the one the sequence has built up.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::{execute, CommandResult};

/// Fetches installer scripts over HTTPS.
pub struct ScriptFetcher {
    client: Client,
}

impl ScriptFetcher {
    /// Create a fetcher with a 30-second timeout.
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent("cairn")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Fetch an installer script from a URL.
    pub fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CairnError::FetchFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(CairnError::FetchFailed {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response.text().map_err(|e| CairnError::FetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for ScriptFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `script` to a private temp file and run it with `args`.
///
/// The script file is removed afterwards regardless of outcome.
pub fn run_script(
    name: &str,
    script: &str,
    args: &[&str],
    env: &ExecEnv,
) -> Result<CommandResult> {
    let path = script_path(name);
    std::fs::write(&path, script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700))?;
    }

    let command = if args.is_empty() {
        format!("sh '{}'", path.display())
    } else {
        format!("sh '{}' {}", path.display(), args.join(" "))
    };

    let result = execute(&command, &env.command_options());
    let _ = std::fs::remove_file(&path);
    result
}

/// Fetch an installer script and run it in one step.
pub fn fetch_and_run(
    fetcher: &ScriptFetcher,
    name: &str,
    url: &str,
    args: &[&str],
    env: &ExecEnv,
) -> Result<CommandResult> {
    let script = fetcher.fetch(url)?;
    run_script(name, &script, args, env)
}

fn script_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cairn-{}-{}.sh", name, std::process::id()))
}
