//! Vendor settings file merge.
//!
//! The vendor CLI reads a JSON settings object with a nested `env` map of
//! string key/value pairs. Cairn owns a fixed subset of those keys and
//! must never disturb the rest: unrelated top-level keys and unrelated
//! `env` keys survive the merge untouched.
//!
//! Writes are atomic (temp file in the same directory, then rename) and
//! the file ends up owner read/write only, since the payload can carry
//! credentials.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{CairnError, Result};

/// File mode for the settings file: owner read/write only.
#[cfg(unix)]
const SETTINGS_MODE: u32 = 0o600;

/// Merge `env_pairs` into the `env` object of the JSON settings file at
/// `path`, creating the file (and `env`) as needed.
///
/// A missing or empty file starts from `{}`. Conflicting `env` keys are
/// overwritten; everything else is preserved. Serialization uses sorted
/// keys, so merging the same payload repeatedly is byte-stable.
pub fn merge_settings(path: &Path, env_pairs: &BTreeMap<String, String>) -> Result<()> {
    let mut root = read_settings(path)?;

    let env = root
        .entry("env")
        .or_insert_with(|| Value::Object(Map::new()));

    let env_map = env
        .as_object_mut()
        .ok_or_else(|| CairnError::SettingsMergeError {
            path: path.to_path_buf(),
            message: "existing 'env' field is not an object".to_string(),
        })?;

    for (key, value) in env_pairs {
        env_map.insert(key.clone(), Value::String(value.clone()));
    }

    write_settings(path, &root)
}

/// Read the settings object, treating a missing or empty file as `{}`.
fn read_settings(path: &Path) -> Result<Map<String, Value>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: Value =
        serde_json::from_str(&content).map_err(|e| CairnError::SettingsMergeError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CairnError::SettingsMergeError {
            path: path.to_path_buf(),
            message: "settings file is not a JSON object".to_string(),
        }),
    }
}

/// Write the settings object atomically and restrict its permissions.
fn write_settings(path: &Path, root: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut content = serde_json::to_string_pretty(&Value::Object(root.clone()))
        .map_err(|e| CairnError::SettingsMergeError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    content.push('\n');

    // Atomic write: temp file next to the target, then rename.
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(SETTINGS_MODE))?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn missing_file_becomes_env_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        assert_eq!(read_json(&path), serde_json::json!({"env": {"A": "1"}}));
    }

    #[test]
    fn empty_file_becomes_env_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, "").unwrap();

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        assert_eq!(read_json(&path), serde_json::json!({"env": {"A": "1"}}));
    }

    #[test]
    fn unrelated_top_level_keys_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"other":1}"#).unwrap();

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        assert_eq!(
            read_json(&path),
            serde_json::json!({"other": 1, "env": {"A": "1"}})
        );
    }

    #[test]
    fn unrelated_env_keys_preserved_and_conflicts_overwritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"env":{"A":"0","B":"2"}}"#).unwrap();

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        assert_eq!(
            read_json(&path),
            serde_json::json!({"env": {"A": "1", "B": "2"}})
        );
    }

    #[test]
    fn merge_is_byte_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        let payload = pairs(&[("REGION", "eu-west-1"), ("TOKEN", "abc123")]);

        merge_settings(&path, &payload).unwrap();
        let first = fs::read(&path).unwrap();

        merge_settings(&path, &payload).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn settings_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn non_object_env_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"env":"not-an-object"}"#).unwrap();

        let err = merge_settings(&path, &pairs(&[("A", "1")])).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn non_object_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"[1,2,3]"#).unwrap();

        assert!(merge_settings(&path, &pairs(&[("A", "1")])).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        assert!(merge_settings(&path, &pairs(&[("A", "1")])).is_err());
    }

    #[test]
    fn no_temp_file_left_behind() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn parent_directories_are_created() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/.vendor/settings.json");

        merge_settings(&path, &pairs(&[("A", "1")])).unwrap();

        assert!(path.exists());
    }
}
