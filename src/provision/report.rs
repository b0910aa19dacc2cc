//! Version report over all provisioned tools.

use serde_json::{Map, Value};

use crate::config::Manifest;
use crate::provision::ExecEnv;
use crate::shell::execute;
use crate::tools::apt::SystemPackages;
use crate::tools::editor::EditorExtensions;
use crate::tools::node::NodeRuntime;
use crate::tools::poetry::Poetry;
use crate::tools::pyenv::Pyenv;
use crate::tools::rlang::RRuntime;
use crate::tools::vendor::VendorCli;
use crate::tools::Tool;

/// One line of the version report.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pub tool: String,
    pub version: Option<String>,
}

/// Collect installed versions for every tool the sequence manages.
pub fn collect_versions(manifest: &Manifest, env: &ExecEnv) -> Vec<VersionEntry> {
    let pyenv = Pyenv::new(
        manifest.python.resolved_pyenv_root(&env.home),
        &manifest.python.version,
    );

    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(SystemPackages::new(&manifest.system_packages)),
        Box::new(RRuntime::new(&manifest.r.packages)),
        Box::new(pyenv),
        Box::new(Poetry::new(
            &manifest.poetry.version,
            manifest.poetry.force_latest,
        )),
        Box::new(NodeRuntime::new(&manifest.node.globals)),
        Box::new(EditorExtensions::new(
            &manifest.editor.command,
            &manifest.editor.extensions,
        )),
        Box::new(VendorCli::new(&manifest.vendor)),
    ];

    let mut entries: Vec<VersionEntry> = tools
        .iter()
        .map(|tool| VersionEntry {
            tool: tool.name().to_string(),
            version: tool.version_string(env),
        })
        .collect();

    // The pinned interpreter is reported alongside its version manager.
    entries.insert(3, python_entry(env));
    entries
}

/// Version of the interpreter the sequence pins.
fn python_entry(env: &ExecEnv) -> VersionEntry {
    let command = match &env.interpreter {
        Some(path) => format!("'{}' --version", path.display()),
        None => "python3 --version".to_string(),
    };

    let version = execute(&command, &env.command_options())
        .ok()
        .filter(|r| r.success)
        .map(|r| r.stdout.trim().to_string())
        .filter(|s| !s.is_empty());

    VersionEntry {
        tool: "python".to_string(),
        version,
    }
}

/// Render the report as aligned text.
pub fn render_text(entries: &[VersionEntry]) -> String {
    let width = entries.iter().map(|e| e.tool.len()).max().unwrap_or(0);

    entries
        .iter()
        .map(|entry| {
            format!(
                "{:width$}  {}",
                entry.tool,
                entry.version.as_deref().unwrap_or("not installed"),
                width = width
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Render the report as a JSON object (absent tools are `null`).
pub fn render_json(entries: &[VersionEntry]) -> String {
    let mut map = Map::new();
    for entry in entries {
        let value = match &entry.version {
            Some(v) => Value::String(v.clone()),
            None => Value::Null,
        };
        map.insert(entry.tool.clone(), value);
    }
    serde_json::to_string_pretty(&Value::Object(map)).expect("report must serialize")
}
