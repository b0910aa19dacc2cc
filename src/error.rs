//! Error types for cairn operations.
//!
//! This module defines [`CairnError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `CairnError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `CairnError::Other`) for unexpected errors
//! - Only critical steps surface errors to the caller; optional steps log
//!   their failures and the sequence continues

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cairn operations.
#[derive(Debug, Error)]
pub enum CairnError {
    /// Manifest file not found at an explicitly requested location.
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    /// Failed to parse the provisioning manifest.
    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParseError { path: PathBuf, message: String },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// A critical provisioning step failed; the sequence aborts.
    #[error("Critical step '{step}' failed: {message}")]
    CriticalStepFailed { step: String, message: String },

    /// The vendor settings file could not be merged.
    #[error("Failed to merge settings at {path}: {message}")]
    SettingsMergeError { path: PathBuf, message: String },

    /// Downloading an installer script failed.
    #[error("Failed to fetch {url}: {message}")]
    FetchFailed { url: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for cairn operations.
pub type Result<T> = std::result::Result<T, CairnError>;
