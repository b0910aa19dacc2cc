//! CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cairn() -> Command {
    Command::cargo_bin("cairn").expect("binary builds")
}

/// A manifest that keeps every test hermetic: no projects, no
/// extensions, nothing that would reach the network.
fn write_manifest(temp: &TempDir, extra: &str) -> std::path::PathBuf {
    let path = temp.path().join("cairn.yml");
    let base = "python:\n  version: 3.11.9\npoetry:\n  version: 1.8.3\n";
    std::fs::write(&path, format!("{}{}", base, extra)).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    cairn()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("versions"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag_prints_version() {
    cairn()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cairn"));
}

#[test]
fn missing_explicit_manifest_fails() {
    cairn()
        .args(["--manifest", "/nonexistent/cairn.yml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Manifest not found"));
}

#[test]
fn config_prints_resolved_manifest() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "");

    cairn()
        .args(["--manifest", manifest.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3.11.9"))
        .stdout(predicate::str::contains("system_packages"));
}

#[test]
fn config_reflects_cli_overrides() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "");

    cairn()
        .args([
            "--manifest",
            manifest.to_str().unwrap(),
            "--python-version",
            "3.12.4",
            "config",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3.12.4"));
}

#[test]
fn malformed_manifest_reports_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cairn.yml");
    std::fs::write(&path, "python: [broken").unwrap();

    cairn()
        .args(["--manifest", path.to_str().unwrap(), "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse"));
}

#[test]
fn versions_json_covers_managed_tools() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "");

    let assert = cairn()
        .args(["--manifest", manifest.to_str().unwrap(), "versions", "--json"])
        .assert()
        .success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    for tool in ["r", "pyenv", "python", "poetry", "node", "vendor-cli"] {
        assert!(value.get(tool).is_some(), "missing {} in report", tool);
    }
}

#[test]
fn dry_run_skips_every_step() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "");
    let log = temp.path().join("provision.log");

    cairn()
        .args([
            "--manifest",
            manifest.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
            "--quiet",
            "run",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("9 skipped"));
}

#[test]
fn dry_run_honors_skip_filter() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "");
    let log = temp.path().join("provision.log");

    cairn()
        .args([
            "--manifest",
            manifest.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
            "--quiet",
            "run",
            "--dry-run",
            "--skip",
            "node,vendor-cli",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("7 skipped"));
}

#[test]
fn dry_run_writes_log_file() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "");
    let log = temp.path().join("provision.log");

    cairn()
        .args([
            "--manifest",
            manifest.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
            "--quiet",
            "run",
            "--dry-run",
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("dry-run"));
}

#[test]
fn doctor_fails_when_vendor_cli_missing() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(&temp, "vendor:\n  command: cairn-no-such-cli\n");

    cairn()
        .args(["--manifest", manifest.to_str().unwrap(), "doctor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("self-check failed"));
}

#[test]
fn completions_emit_shell_script() {
    cairn()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cairn"));
}

#[test]
fn unknown_subcommand_fails() {
    cairn().arg("frobnicate").assert().failure();
}
