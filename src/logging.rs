//! Tracing setup: stdout plus an append-mode log file.
//!
//! Everything the provisioner reports is mirrored to a log file so a
//! machine's provisioning history survives the terminal session. The
//! file layer writes without ANSI escapes; the stdout layer keeps them.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default log file location, relative to the home directory.
const DEFAULT_LOG_FILE: &str = ".cairn/provision.log";

/// Resolve the log file path: explicit override, else `~/.cairn/provision.log`.
pub fn default_log_file(override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(p) => p.to_path_buf(),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_LOG_FILE),
    }
}

/// Initialize the tracing subscriber.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Returns the path of the log file actually opened, or `None` when the
/// file could not be created (stdout logging still works in that case).
pub fn init_tracing(debug: bool, log_file: Option<&Path>) -> Option<PathBuf> {
    let filter = if debug {
        EnvFilter::new("cairn=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cairn=info"))
    };

    let path = default_log_file(log_file);
    let file = open_log_file(&path);
    let opened = file.as_ref().map(|_| path.clone());

    let file_layer = file.map(|f| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Arc::new(f))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .with(filter)
        .init();

    opened
}

/// Open the log file in append mode, creating parent directories first.
fn open_log_file(path: &Path) -> Option<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_log_file_honors_override() {
        let path = default_log_file(Some(Path::new("/tmp/custom.log")));
        assert_eq!(path, PathBuf::from("/tmp/custom.log"));
    }

    #[test]
    fn default_log_file_falls_back_to_home() {
        let path = default_log_file(None);
        assert!(path.ends_with(".cairn/provision.log"));
    }

    #[test]
    fn open_log_file_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/provision.log");
        assert!(open_log_file(&path).is_some());
        assert!(path.exists());
    }

    #[test]
    fn open_log_file_appends() {
        use std::io::Write;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provision.log");

        let mut f = open_log_file(&path).unwrap();
        writeln!(f, "first run").unwrap();
        drop(f);

        let mut f = open_log_file(&path).unwrap();
        writeln!(f, "second run").unwrap();
        drop(f);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("first run"));
        assert!(content.contains("second run"));
    }
}
