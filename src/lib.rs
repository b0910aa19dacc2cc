//! Cairn - Idempotent development machine provisioning.
//!
//! Cairn replaces ad-hoc `setup.sh` provisioning scripts with a fixed,
//! strictly linear sequence of guarded installation steps driven by a
//! YAML manifest. Every step carries its own presence check, so re-running
//! the sequence on an already-provisioned machine is a no-op.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Provisioning manifest loading and environment overrides
//! - [`error`] - Error types and result aliases
//! - [`logging`] - Stdout plus log-file tracing setup
//! - [`projects`] - Per-project virtual environment configuration
//! - [`provision`] - The guarded step sequence and version report
//! - [`settings`] - Vendor settings file JSON merge
//! - [`shell`] - Shell command execution and profile file patching
//! - [`tools`] - Capability interfaces over the external tools
//! - [`ui`] - Terminal status reporting
//!
//! # Example
//!
//! ```
//! use cairn::config::Manifest;
//!
//! // A manifest parsed from YAML; absent sections fall back to defaults.
//! let manifest: Manifest = serde_yaml::from_str("python:\n  version: 3.12.4\n").unwrap();
//! assert_eq!(manifest.python.version, "3.12.4");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod projects;
pub mod provision;
pub mod settings;
pub mod shell;
pub mod tools;
pub mod ui;

pub use error::{CairnError, Result};
