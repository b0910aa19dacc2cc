//! Capability interfaces over the external tools.
//!
//! Every external dependency (R runtime, pyenv, Poetry, Node.js, vendor
//! CLI) sits behind the [`Tool`] trait, so the provisioning sequence is
//! tool-agnostic and testable with fake implementations.

pub mod apt;
pub mod editor;
pub mod fetch;
pub mod node;
pub mod poetry;
pub mod presence;
pub mod pyenv;
pub mod rlang;
pub mod vendor;

pub use fetch::ScriptFetcher;
pub use presence::{is_executable, resolve_tool_path};

use crate::error::Result;
use crate::provision::ExecEnv;

/// Capability interface for an externally installed tool.
///
/// `install` takes the environment mutably because some tools extend the
/// PATH model for the steps that follow them (pyenv adds its `bin` and
/// `shims` directories).
pub trait Tool {
    /// Tool name as shown in step output and the version report.
    fn name(&self) -> &str;

    /// Whether the tool already satisfies this machine's requirements.
    fn is_present(&self, env: &ExecEnv) -> bool;

    /// Install the tool; only called when `is_present` returned false.
    fn install(&self, env: &mut ExecEnv) -> Result<()>;

    /// Human-readable installed version, or `None` when absent.
    fn version_string(&self, env: &ExecEnv) -> Option<String>;
}
