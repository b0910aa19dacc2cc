//! Idempotent shell profile file patching.
//!
//! Provisioning needs a handful of lines (version manager activation,
//! `~/.local/bin` on PATH) present in the user's shell startup files.
//! The appender only ever adds: a line is written when no existing line
//! in the file is byte-identical to it, and pre-existing content is
//! never rewritten or deduplicated.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The shell profile files cairn patches, one per supported shell.
pub fn profile_files(home: &Path) -> Vec<PathBuf> {
    vec![home.join(".bashrc"), home.join(".zshrc")]
}

/// Append `line` to the file at `path` unless an identical line is present.
///
/// A missing file is treated as empty, so the append creates it (parent
/// directories included). A file that exists but cannot be read is
/// assumed to lack the line and the append proceeds. Returns `true` when
/// the line was written, `false` when it was already present.
pub fn append_line_once(path: &Path, line: &str) -> Result<bool> {
    let existing = std::fs::read_to_string(path).unwrap_or_default();

    if existing.lines().any(|l| l == line) {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    // Keep the appended line on its own line even when the file lacks a
    // trailing newline.
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{}", line)?;

    Ok(true)
}

/// Append `line` to every profile file, reporting which files changed.
pub fn append_to_profiles(home: &Path, line: &str) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    for profile in profile_files(home) {
        if append_line_once(&profile, line)? {
            changed.push(profile);
        }
    }
    Ok(changed)
}
