//! Shell command execution and profile file patching.

pub mod command;
pub mod profile;

pub use command::{execute, execute_check, execute_quiet, CommandOptions, CommandResult};
pub use profile::{append_line_once, append_to_profiles, profile_files};

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}
