//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct. The `CAIRN_*` environment
//! variables bind to the same options the manifest configures, and win
//! over manifest values.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::EnvOverrides;

/// Cairn - Idempotent development machine provisioning.
#[derive(Debug, Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to manifest file (overrides the default search)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log file path (default: ~/.cairn/provision.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Override the pyenv root directory
    #[arg(long, global = true, env = "CAIRN_PYENV_ROOT")]
    pub pyenv_root: Option<String>,

    /// Override the pinned Python version
    #[arg(long, global = true, env = "CAIRN_PYTHON_VERSION")]
    pub python_version: Option<String>,

    /// Override the pinned Poetry version
    #[arg(long, global = true, env = "CAIRN_POETRY_VERSION")]
    pub poetry_version: Option<String>,

    /// Accept any installed Poetry and install latest when absent
    #[arg(long, global = true, env = "CAIRN_FORCE_LATEST")]
    pub force_latest: bool,

    /// Region written into the vendor CLI settings
    #[arg(long, global = true, env = "CAIRN_REGION")]
    pub region: Option<String>,

    /// Bearer token written into the vendor CLI settings
    #[arg(long, global = true, env = "CAIRN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Collect the manifest overrides carried on the command line.
    pub fn overrides(&self) -> EnvOverrides {
        EnvOverrides {
            pyenv_root: self.pyenv_root.clone(),
            python_version: self.python_version.clone(),
            poetry_version: self.poetry_version.clone(),
            force_latest: self.force_latest,
            region: self.region.clone(),
            token: self.token.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the provisioning sequence (default if no command specified)
    Run(RunArgs),

    /// Print installed versions of all managed tools
    Versions(VersionsArgs),

    /// Print the resolved provisioning manifest
    Config,

    /// Run only the vendor CLI self-check
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Preview steps without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Run only specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,
}

/// Arguments for the `versions` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VersionsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
