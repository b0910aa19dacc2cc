//! The provisioning manifest.
//!
//! Package lists, version pins, project paths, and the vendor settings
//! payload are configuration data, not code. They live in a YAML
//! manifest; every section has defaults so a missing file still yields a
//! usable configuration.
//!
//! Lookup order: `--manifest` flag, `./cairn.yml`, `~/.cairn/manifest.yml`,
//! built-in defaults. Environment overrides (`CAIRN_*`) are applied after
//! parsing and win over file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CairnError, Result};

/// Manifest file name searched for in the working directory.
const PROJECT_MANIFEST: &str = "cairn.yml";

/// The full provisioning manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// OS packages installed in a single package-manager invocation.
    #[serde(default = "default_system_packages")]
    pub system_packages: Vec<String>,

    /// R runtime and package configuration.
    #[serde(default)]
    pub r: RConfig,

    /// Python interpreter configuration.
    #[serde(default)]
    pub python: PythonConfig,

    /// Poetry dependency manager configuration.
    #[serde(default)]
    pub poetry: PoetryConfig,

    /// Project directories to set up virtual environments for.
    /// `~` is expanded when the paths are resolved.
    #[serde(default)]
    pub projects: Vec<String>,

    /// Node.js runtime configuration.
    #[serde(default)]
    pub node: NodeConfig,

    /// Editor extension configuration.
    #[serde(default)]
    pub editor: EditorConfig,

    /// Vendor CLI configuration.
    #[serde(default)]
    pub vendor: VendorConfig,
}

impl Default for Manifest {
    fn default() -> Self {
        // Round-trips through serde so the defaults live in one place.
        serde_yaml::from_str("{}").expect("empty manifest must deserialize")
    }
}

/// R runtime section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RConfig {
    /// R packages installed only when not already present.
    #[serde(default = "default_r_packages")]
    pub packages: Vec<String>,
}

impl Default for RConfig {
    fn default() -> Self {
        Self {
            packages: default_r_packages(),
        }
    }
}

/// Python interpreter section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PythonConfig {
    /// Pinned interpreter version installed and selected via pyenv.
    #[serde(default = "default_python_version")]
    pub version: String,

    /// pyenv root directory; defaults to `~/.pyenv`.
    #[serde(default)]
    pub pyenv_root: Option<String>,

    /// pyenv installer script URL; defaults to the public endpoint.
    #[serde(default)]
    pub installer_url: Option<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            version: default_python_version(),
            pyenv_root: None,
            installer_url: None,
        }
    }
}

impl PythonConfig {
    /// Resolve the pyenv root: configured value (tilde-expanded) or `~/.pyenv`.
    pub fn resolved_pyenv_root(&self, home: &Path) -> PathBuf {
        match &self.pyenv_root {
            Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
            None => home.join(".pyenv"),
        }
    }
}

/// Poetry section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoetryConfig {
    /// Pinned Poetry version; presence checks match this exactly.
    #[serde(default = "default_poetry_version")]
    pub version: String,

    /// When set, any installed Poetry passes the presence check and a
    /// fresh install takes whatever the installer's default channel serves.
    #[serde(default)]
    pub force_latest: bool,

    /// Poetry installer script URL; defaults to the public endpoint.
    #[serde(default)]
    pub installer_url: Option<String>,
}

impl Default for PoetryConfig {
    fn default() -> Self {
        Self {
            version: default_poetry_version(),
            force_latest: false,
            installer_url: None,
        }
    }
}

/// Node.js section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Global npm packages installed best-effort.
    #[serde(default)]
    pub globals: Vec<String>,
}

/// Editor extension section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
    /// Editor CLI binary; extensions are skipped when it is absent.
    #[serde(default = "default_editor_command")]
    pub command: String,

    /// Extensions installed best-effort.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: default_editor_command(),
            extensions: Vec::new(),
        }
    }
}

/// Vendor CLI section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VendorConfig {
    /// Vendor CLI binary name.
    #[serde(default = "default_vendor_command")]
    pub command: String,

    /// Installer script URL; empty disables the install step.
    #[serde(default)]
    pub installer_url: String,

    /// Settings file the env payload is merged into; `~` is expanded.
    #[serde(default = "default_vendor_settings_file")]
    pub settings_file: String,

    /// Region written into the settings `env` object.
    #[serde(default)]
    pub region: String,

    /// Bearer token written into the settings `env` object.
    #[serde(default)]
    pub token: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            command: default_vendor_command(),
            installer_url: String::new(),
            settings_file: default_vendor_settings_file(),
            region: String::new(),
            token: String::new(),
        }
    }
}

impl VendorConfig {
    /// Resolve the settings file path with `~` expanded.
    pub fn resolved_settings_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.settings_file).into_owned())
    }
}

fn default_system_packages() -> Vec<String> {
    [
        "build-essential",
        "curl",
        "git",
        "libbz2-dev",
        "libcurl4-openssl-dev",
        "libffi-dev",
        "liblzma-dev",
        "libreadline-dev",
        "libsqlite3-dev",
        "libssl-dev",
        "libxml2-dev",
        "zlib1g-dev",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_r_packages() -> Vec<String> {
    ["renv", "devtools", "data.table", "jsonlite"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_python_version() -> String {
    "3.11.9".to_string()
}

fn default_poetry_version() -> String {
    "1.8.3".to_string()
}

fn default_editor_command() -> String {
    "code".to_string()
}

fn default_vendor_command() -> String {
    "vendor-cli".to_string()
}

fn default_vendor_settings_file() -> String {
    "~/.vendor-cli/settings.json".to_string()
}

/// Environment-variable overrides applied over the parsed manifest.
///
/// Bound to `CAIRN_*` variables through clap's `env` feature; see
/// [`crate::cli::args::Cli`].
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub pyenv_root: Option<String>,
    pub python_version: Option<String>,
    pub poetry_version: Option<String>,
    pub force_latest: bool,
    pub region: Option<String>,
    pub token: Option<String>,
}

impl Manifest {
    /// Load the manifest for this invocation.
    ///
    /// An explicit path must exist; the search locations may be absent,
    /// in which case built-in defaults apply. Returns the manifest and
    /// the path it was read from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CairnError::ManifestNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                return Ok((Self::from_file(&candidate)?, Some(candidate)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Parse a manifest file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| CairnError::ManifestParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Manifest search locations, in priority order.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PROJECT_MANIFEST)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cairn").join("manifest.yml"));
        }
        paths
    }

    /// Apply environment-variable overrides over the file values.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) {
        if let Some(root) = &overrides.pyenv_root {
            self.python.pyenv_root = Some(root.clone());
        }
        if let Some(version) = &overrides.python_version {
            self.python.version = version.clone();
        }
        if let Some(version) = &overrides.poetry_version {
            self.poetry.version = version.clone();
        }
        if overrides.force_latest {
            self.poetry.force_latest = true;
        }
        if let Some(region) = &overrides.region {
            self.vendor.region = region.clone();
        }
        if let Some(token) = &overrides.token {
            self.vendor.token = token.clone();
        }
    }

    /// Project directories with `~` expanded.
    pub fn expanded_projects(&self) -> Vec<PathBuf> {
        self.projects
            .iter()
            .map(|raw| PathBuf::from(shellexpand::tilde(raw).into_owned()))
            .collect()
    }

    /// Render the resolved manifest back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            CairnError::Other(anyhow::anyhow!("failed to serialize manifest: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_yaml_yields_defaults() {
        let manifest: Manifest = serde_yaml::from_str("{}").unwrap();
        assert!(!manifest.system_packages.is_empty());
        assert_eq!(manifest.python.version, default_python_version());
        assert_eq!(manifest.poetry.version, default_poetry_version());
        assert!(!manifest.poetry.force_latest);
        assert!(manifest.projects.is_empty());
    }

    #[test]
    fn partial_yaml_overrides_one_section() {
        let manifest: Manifest = serde_yaml::from_str(
            "python:\n  version: 3.12.1\nprojects:\n  - ~/work/api\n  - ~/work/etl\n",
        )
        .unwrap();

        assert_eq!(manifest.python.version, "3.12.1");
        assert_eq!(manifest.projects.len(), 2);
        // Untouched sections keep their defaults
        assert_eq!(manifest.poetry.version, default_poetry_version());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: std::result::Result<Manifest, _> = serde_yaml::from_str("typo_section: 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reports_parse_errors_with_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cairn.yml");
        std::fs::write(&path, "python: [not, a, map]").unwrap();

        let err = Manifest::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("cairn.yml"));
    }

    #[test]
    fn load_explicit_missing_is_an_error() {
        let err = Manifest::load(Some(Path::new("/nonexistent/cairn.yml"))).unwrap_err();
        assert!(matches!(err, CairnError::ManifestNotFound { .. }));
    }

    #[test]
    fn load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cairn.yml");
        std::fs::write(&path, "poetry:\n  version: 1.7.0\n").unwrap();

        let (manifest, source) = Manifest::load(Some(&path)).unwrap();
        assert_eq!(manifest.poetry.version, "1.7.0");
        assert_eq!(source, Some(path));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut manifest: Manifest =
            serde_yaml::from_str("python:\n  version: 3.10.0\n").unwrap();

        manifest.apply_overrides(&EnvOverrides {
            python_version: Some("3.12.4".to_string()),
            poetry_version: Some("1.8.0".to_string()),
            force_latest: true,
            region: Some("eu-west-1".to_string()),
            token: Some("secret".to_string()),
            pyenv_root: Some("/opt/pyenv".to_string()),
        });

        assert_eq!(manifest.python.version, "3.12.4");
        assert_eq!(manifest.poetry.version, "1.8.0");
        assert!(manifest.poetry.force_latest);
        assert_eq!(manifest.vendor.region, "eu-west-1");
        assert_eq!(manifest.vendor.token, "secret");
        assert_eq!(manifest.python.pyenv_root.as_deref(), Some("/opt/pyenv"));
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let mut manifest = Manifest::default();
        let before = manifest.to_yaml().unwrap();

        manifest.apply_overrides(&EnvOverrides::default());

        assert_eq!(manifest.to_yaml().unwrap(), before);
    }

    #[test]
    fn pyenv_root_defaults_under_home() {
        let config = PythonConfig::default();
        let root = config.resolved_pyenv_root(Path::new("/home/dev"));
        assert_eq!(root, PathBuf::from("/home/dev/.pyenv"));
    }

    #[test]
    fn pyenv_root_override_is_used() {
        let config = PythonConfig {
            version: "3.11.9".into(),
            pyenv_root: Some("/opt/pyenv".into()),
            installer_url: None,
        };
        let root = config.resolved_pyenv_root(Path::new("/home/dev"));
        assert_eq!(root, PathBuf::from("/opt/pyenv"));
    }

    #[test]
    fn expanded_projects_resolves_tilde() {
        let manifest: Manifest =
            serde_yaml::from_str("projects:\n  - /abs/path\n  - ~/rel/path\n").unwrap();

        let projects = manifest.expanded_projects();
        assert_eq!(projects[0], PathBuf::from("/abs/path"));
        assert!(!projects[1].to_string_lossy().starts_with('~'));
    }

    #[test]
    fn vendor_settings_file_expands_tilde() {
        let config = VendorConfig::default();
        let path = config.resolved_settings_file();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".vendor-cli/settings.json"));
    }

    #[test]
    fn manifest_round_trips_through_yaml() {
        let manifest = Manifest::default();
        let yaml = manifest.to_yaml().unwrap();
        let reparsed: Manifest = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reparsed.python.version, manifest.python.version);
        assert_eq!(reparsed.system_packages, manifest.system_packages);
    }
}
