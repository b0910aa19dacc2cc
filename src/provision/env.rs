//! Explicit execution environment for provisioning steps.
//!
//! Nothing in the sequence mutates the parent process environment. Each
//! step receives an [`ExecEnv`] describing the PATH model, extra
//! variables, and the home directory; steps that change the environment
//! (pyenv adding its `bin` and `shims` directories) apply the change to
//! this value, and every later step sees it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::shell::CommandOptions;
use crate::tools::presence::resolve_tool_path;

/// The environment a provisioning step runs against.
#[derive(Debug, Clone)]
pub struct ExecEnv {
    /// PATH entries, highest priority first.
    path_entries: Vec<PathBuf>,

    /// Extra environment variables serialised into every spawned command.
    vars: HashMap<String, String>,

    /// Home directory of the user being provisioned.
    pub home: PathBuf,

    /// Pinned interpreter binary, once the version manager step has run.
    pub interpreter: Option<PathBuf>,
}

impl ExecEnv {
    /// Build from the current process environment.
    pub fn from_system() -> Self {
        let path_entries = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();

        Self {
            path_entries,
            vars: HashMap::new(),
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
            interpreter: None,
        }
    }

    /// Build an isolated environment rooted at `home` (tests).
    pub fn with_home(home: &Path) -> Self {
        Self {
            path_entries: Vec::new(),
            vars: HashMap::new(),
            home: home.to_path_buf(),
            interpreter: None,
        }
    }

    /// Prepend a directory to the PATH model, deduplicating.
    pub fn prepend_path(&mut self, dir: &Path) {
        if self.path_entries.first().map(|p| p.as_path()) == Some(dir) {
            return;
        }
        self.path_entries.retain(|p| p != dir);
        self.path_entries.insert(0, dir.to_path_buf());
    }

    /// The PATH entries, highest priority first.
    pub fn path_entries(&self) -> &[PathBuf] {
        &self.path_entries
    }

    /// Render the PATH model as a `PATH` string.
    pub fn path_string(&self) -> String {
        std::env::join_paths(&self.path_entries)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Set an extra environment variable.
    pub fn set_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Find a tool on the PATH model.
    pub fn lookup(&self, tool: &str) -> Option<PathBuf> {
        resolve_tool_path(tool, &self.path_entries)
    }

    /// Command options carrying this environment, output captured.
    pub fn command_options(&self) -> CommandOptions {
        let mut env = self.vars.clone();
        env.insert("PATH".to_string(), self.path_string());
        env.insert("HOME".to_string(), self.home.to_string_lossy().into_owned());

        CommandOptions {
            env,
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_system_picks_up_path() {
        let env = ExecEnv::from_system();
        // Every sane test environment has a non-empty PATH.
        assert!(!env.path_entries().is_empty());
    }

    #[test]
    fn prepend_path_puts_entry_first() {
        let mut env = ExecEnv::with_home(Path::new("/home/dev"));
        env.prepend_path(Path::new("/usr/bin"));
        env.prepend_path(Path::new("/opt/tool/bin"));

        assert_eq!(env.path_entries()[0], PathBuf::from("/opt/tool/bin"));
        assert_eq!(env.path_entries()[1], PathBuf::from("/usr/bin"));
    }

    #[test]
    fn prepend_path_deduplicates() {
        let mut env = ExecEnv::with_home(Path::new("/home/dev"));
        env.prepend_path(Path::new("/usr/bin"));
        env.prepend_path(Path::new("/opt/tool/bin"));
        env.prepend_path(Path::new("/usr/bin"));

        assert_eq!(env.path_entries().len(), 2);
        assert_eq!(env.path_entries()[0], PathBuf::from("/usr/bin"));
    }

    #[test]
    fn path_string_joins_entries() {
        let mut env = ExecEnv::with_home(Path::new("/home/dev"));
        env.prepend_path(Path::new("/b"));
        env.prepend_path(Path::new("/a"));

        assert_eq!(env.path_string(), "/a:/b");
    }

    #[test]
    fn command_options_carry_path_and_home() {
        let mut env = ExecEnv::with_home(Path::new("/home/dev"));
        env.prepend_path(Path::new("/a"));
        env.set_var("PYENV_ROOT", "/home/dev/.pyenv");

        let options = env.command_options();
        assert_eq!(options.env.get("PATH").unwrap(), "/a");
        assert_eq!(options.env.get("HOME").unwrap(), "/home/dev");
        assert_eq!(options.env.get("PYENV_ROOT").unwrap(), "/home/dev/.pyenv");
        assert!(options.capture_stdout);
    }

    #[test]
    fn lookup_finds_binaries_on_path_model() {
        use std::fs;

        let temp = tempfile::TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let tool = bin.join("mytool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let mut env = ExecEnv::with_home(temp.path());
        env.prepend_path(&bin);

        assert_eq!(env.lookup("mytool"), Some(tool));
        assert_eq!(env.lookup("othertool"), None);
    }
}
