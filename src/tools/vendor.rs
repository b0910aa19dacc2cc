//! Vendor CLI installation, configuration, and self-check.
//!
//! The vendor tool is installed from its published installer script when
//! absent, otherwise its own update subcommand runs. Configuration means
//! making sure `~/.local/bin` reaches future shells and merging the
//! region/token payload into the tool's JSON settings file. The
//! diagnostic self-check reports but never fails the run.

use std::collections::BTreeMap;

use crate::config::VendorConfig;
use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::settings::merge_settings;
use crate::shell::{execute, profile::append_to_profiles};
use crate::tools::fetch::{fetch_and_run, ScriptFetcher};
use crate::tools::Tool;

/// Settings `env` key for the region.
const REGION_KEY: &str = "VENDOR_REGION";

/// Settings `env` key for the bearer token.
const TOKEN_KEY: &str = "VENDOR_AUTH_TOKEN";

/// Profile line keeping the vendor install directory on PATH.
const LOCAL_BIN_LINE: &str = "export PATH=\"$HOME/.local/bin:$PATH\"";

/// Remediation hints printed when the self-check fails.
const SELF_CHECK_HINTS: &str = "\
The self-check failed. Common fixes:
  - Open a new shell so PATH changes take effect
  - Verify the region setting matches your account
  - Re-issue the auth token if it has expired
  - Re-run provisioning after fixing the above";

/// The vendor CLI described by the manifest's `vendor` section.
pub struct VendorCli {
    config: VendorConfig,
}

impl VendorCli {
    pub fn new(config: &VendorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// The settings payload: only keys with configured values.
    fn settings_payload(&self) -> BTreeMap<String, String> {
        let mut payload = BTreeMap::new();
        if !self.config.region.is_empty() {
            payload.insert(REGION_KEY.to_string(), self.config.region.clone());
        }
        if !self.config.token.is_empty() {
            payload.insert(TOKEN_KEY.to_string(), self.config.token.clone());
        }
        payload
    }

    /// Run the tool's update subcommand; best-effort.
    pub fn update(&self, env: &ExecEnv) -> Result<()> {
        let command = format!("{} update", self.config.command);
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

    /// Put `~/.local/bin` on the PATH model and in future shells, then
    /// merge the settings payload into the tool's settings file.
    pub fn configure(&self, env: &mut ExecEnv) -> Result<()> {
        let local_bin = env.home.join(".local").join("bin");
        env.prepend_path(&local_bin);
        append_to_profiles(&env.home, LOCAL_BIN_LINE)?;

        let payload = self.settings_payload();
        if payload.is_empty() {
            tracing::debug!("No vendor settings configured; skipping merge");
            return Ok(());
        }

        let settings_file = self.config.resolved_settings_file();
        tracing::info!("Merging vendor settings into {}", settings_file.display());
        merge_settings(&settings_file, &payload)
    }

    /// Run the diagnostic subcommand.
    ///
    /// Returns whether it passed; a failure prints remediation hints and
    /// never propagates as an error.
    pub fn self_check(&self, env: &ExecEnv) -> bool {
        let command = format!("{} doctor", self.config.command);
        match execute(&command, &env.command_options()) {
            Ok(result) if result.success => {
                tracing::info!("{} self-check passed", self.config.command);
                true
            }
            Ok(result) => {
                tracing::warn!(
                    "{} self-check failed (exit {:?})",
                    self.config.command,
                    result.exit_code
                );
                eprintln!("{}", SELF_CHECK_HINTS);
                false
            }
            Err(_) => {
                tracing::warn!("{} self-check could not run", self.config.command);
                eprintln!("{}", SELF_CHECK_HINTS);
                false
            }
        }
    }
}

impl Tool for VendorCli {
    fn name(&self) -> &str {
        "vendor-cli"
    }

    fn is_present(&self, env: &ExecEnv) -> bool {
        env.lookup(&self.config.command).is_some()
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        if self.config.installer_url.is_empty() {
            return Err(CairnError::Other(anyhow::anyhow!(
                "no installer URL configured for '{}'",
                self.config.command
            )));
        }

        tracing::info!("Installing {} CLI", self.config.command);
        let fetcher = ScriptFetcher::new();
        let result = fetch_and_run(
            &fetcher,
            &self.config.command,
            &self.config.installer_url,
            &[],
            env,
        )?;
        if result.success {
            Ok(())
        } else {
            Err(CairnError::CommandFailed {
                command: format!("{} installer ({})", self.config.command, self.config.installer_url),
                code: result.exit_code,
            })
        }
    }

    fn version_string(&self, env: &ExecEnv) -> Option<String> {
        let result = execute(
            &format!("{} --version", self.config.command),
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(temp: &TempDir) -> VendorConfig {
        VendorConfig {
            command: "vendor-cli".to_string(),
            installer_url: String::new(),
            settings_file: temp
                .path()
                .join("settings.json")
                .to_string_lossy()
                .into_owned(),
            region: "eu-west-1".to_string(),
            token: "tok-123".to_string(),
        }
    }

    #[test]
    fn payload_contains_configured_values() {
        let temp = TempDir::new().unwrap();
        let tool = VendorCli::new(&config_for(&temp));

        let payload = tool.settings_payload();
        assert_eq!(payload.get(REGION_KEY).unwrap(), "eu-west-1");
        assert_eq!(payload.get(TOKEN_KEY).unwrap(), "tok-123");
    }

    #[test]
    fn payload_omits_empty_values() {
        let temp = TempDir::new().unwrap();
        let mut config = config_for(&temp);
        config.token = String::new();
        let tool = VendorCli::new(&config);

        let payload = tool.settings_payload();
        assert!(payload.contains_key(REGION_KEY));
        assert!(!payload.contains_key(TOKEN_KEY));
    }

    #[test]
    fn configure_merges_settings() {
        let temp = TempDir::new().unwrap();
        let tool = VendorCli::new(&config_for(&temp));
        let mut env = ExecEnv::with_home(temp.path());

        tool.configure(&mut env).unwrap();

        let content = std::fs::read_to_string(temp.path().join("settings.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["env"][REGION_KEY], "eu-west-1");
        assert_eq!(value["env"][TOKEN_KEY], "tok-123");
    }

    #[test]
    fn configure_patches_profiles_and_path() {
        let temp = TempDir::new().unwrap();
        let tool = VendorCli::new(&config_for(&temp));
        let mut env = ExecEnv::with_home(temp.path());

        tool.configure(&mut env).unwrap();

        let bashrc = std::fs::read_to_string(temp.path().join(".bashrc")).unwrap();
        assert!(bashrc.contains(LOCAL_BIN_LINE));
        assert_eq!(
            env.path_entries()[0],
            temp.path().join(".local").join("bin")
        );
    }

    #[test]
    fn configure_without_payload_writes_no_settings() {
        let temp = TempDir::new().unwrap();
        let mut config = config_for(&temp);
        config.region = String::new();
        config.token = String::new();
        let tool = VendorCli::new(&config);
        let mut env = ExecEnv::with_home(temp.path());

        tool.configure(&mut env).unwrap();

        assert!(!temp.path().join("settings.json").exists());
    }

    #[test]
    fn install_without_url_is_an_error() {
        let temp = TempDir::new().unwrap();
        let tool = VendorCli::new(&config_for(&temp));
        let mut env = ExecEnv::with_home(temp.path());

        assert!(tool.install(&mut env).is_err());
    }

    #[test]
    fn absent_binary_is_not_present() {
        let temp = TempDir::new().unwrap();
        let tool = VendorCli::new(&config_for(&temp));
        let env = ExecEnv::with_home(temp.path());
        assert!(!tool.is_present(&env));
    }
}
