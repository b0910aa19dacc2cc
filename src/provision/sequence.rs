//! The fixed provisioning sequence.
//!
//! Strictly linear: each step completes (or is explicitly allowed to
//! fail) before the next begins. Every step carries a `critical` flag;
//! a failing critical step aborts the run, a failing optional step is
//! logged and the sequence continues.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config::Manifest;
use crate::error::{CairnError, Result};
use crate::projects::{self, ProjectStatus};
use crate::provision::env::ExecEnv;
use crate::provision::report::{collect_versions, render_text};
use crate::provision::step::{StepOutcome, StepReport, StepStatus};
use crate::tools::apt::SystemPackages;
use crate::tools::editor::EditorExtensions;
use crate::tools::node::NodeRuntime;
use crate::tools::poetry::Poetry;
use crate::tools::pyenv::Pyenv;
use crate::tools::rlang::RRuntime;
use crate::tools::vendor::VendorCli;
use crate::tools::Tool;
use crate::ui::Reporter;

/// Options controlling a sequence run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Log planned steps without executing anything.
    pub dry_run: bool,

    /// Run only these step names (empty = all).
    pub only: Vec<String>,

    /// Skip these step names.
    pub skip: Vec<String>,
}

/// Result of a full sequence run.
#[derive(Debug)]
pub struct RunSummary {
    /// One report per selected step, in execution order.
    pub reports: Vec<StepReport>,

    /// Wall-clock duration of the run.
    pub duration: Duration,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Whether any step failed (critical failures never reach here).
    pub fn has_failures(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.status == StepStatus::Failed)
    }
}

/// Run the presence check and, when needed, the install procedure.
pub fn guarded_install(tool: &dyn Tool, env: &mut ExecEnv) -> Result<StepOutcome> {
    if tool.is_present(env) {
        tracing::debug!("{} already present; skipping install", tool.name());
        return Ok(StepOutcome::AlreadyPresent);
    }
    tool.install(env)?;
    Ok(StepOutcome::Installed)
}

type StepFn = Box<dyn FnOnce(&mut ExecEnv) -> Result<StepOutcome>>;

struct Step {
    name: &'static str,
    critical: bool,
    run: StepFn,
}

/// Execute the provisioning sequence against `env`.
pub fn run_sequence(
    manifest: &Manifest,
    env: &mut ExecEnv,
    options: &RunOptions,
    reporter: &mut Reporter,
) -> Result<RunSummary> {
    let started = Instant::now();

    let steps: Vec<Step> = build_steps(manifest, env)
        .into_iter()
        .filter(|step| is_selected(step.name, options))
        .collect();
    let total = steps.len();

    let mut reports = Vec::with_capacity(total);

    for (index, step) in steps.into_iter().enumerate() {
        reporter.step_started(index + 1, total, step.name);

        let report = if options.dry_run {
            tracing::info!("[dry-run] would run step '{}'", step.name);
            StepReport {
                name: step.name.to_string(),
                status: StepStatus::Skipped,
                duration: Duration::ZERO,
                detail: Some("dry-run".to_string()),
            }
        } else {
            run_step(step.name, step.critical, step.run, env, reporter, &mut reports)?
        };

        reporter.step_finished(&report);
        reports.push(report);
    }

    Ok(RunSummary {
        reports,
        duration: started.elapsed(),
        finished_at: Utc::now(),
    })
}

/// Run one step, converting its outcome per the criticality policy.
///
/// On a critical failure the report is finalized here so the abort
/// still shows up in the step output, then the error propagates.
fn run_step(
    name: &'static str,
    critical: bool,
    run: StepFn,
    env: &mut ExecEnv,
    reporter: &mut Reporter,
    reports: &mut Vec<StepReport>,
) -> Result<StepReport> {
    let start = Instant::now();

    match run(env) {
        Ok(outcome) => {
            let (status, detail) = match outcome {
                StepOutcome::AlreadyPresent => {
                    (StepStatus::Skipped, Some("already present".to_string()))
                }
                StepOutcome::Installed => (StepStatus::Completed, None),
                StepOutcome::Done(detail) => (StepStatus::Completed, Some(detail)),
            };
            Ok(StepReport {
                name: name.to_string(),
                status,
                duration: start.elapsed(),
                detail,
            })
        }
        Err(e) if critical => {
            let report = StepReport {
                name: name.to_string(),
                status: StepStatus::Failed,
                duration: start.elapsed(),
                detail: Some(e.to_string()),
            };
            reporter.step_finished(&report);
            reports.push(report);
            Err(CairnError::CriticalStepFailed {
                step: name.to_string(),
                message: e.to_string(),
            })
        }
        Err(e) => {
            tracing::warn!("Step '{}' failed (continuing): {}", name, e);
            Ok(StepReport {
                name: name.to_string(),
                status: StepStatus::Failed,
                duration: start.elapsed(),
                detail: Some(e.to_string()),
            })
        }
    }
}

fn is_selected(name: &str, options: &RunOptions) -> bool {
    if options.skip.iter().any(|s| s == name) {
        return false;
    }
    options.only.is_empty() || options.only.iter().any(|s| s == name)
}

/// Build the ordered step list. Tools own their configuration, so the
/// returned closures borrow nothing.
fn build_steps(manifest: &Manifest, env: &ExecEnv) -> Vec<Step> {
    let mut steps = Vec::new();

    let system = SystemPackages::new(&manifest.system_packages);
    steps.push(Step {
        name: "system-packages",
        critical: true,
        run: Box::new(move |env| guarded_install(&system, env)),
    });

    let r = RRuntime::new(&manifest.r.packages);
    steps.push(Step {
        name: "r",
        critical: true,
        run: Box::new(move |env| guarded_install(&r, env)),
    });

    let editor = EditorExtensions::new(&manifest.editor.command, &manifest.editor.extensions);
    steps.push(Step {
        name: "editor-extensions",
        critical: false,
        run: Box::new(move |env| guarded_install(&editor, env)),
    });

    let mut pyenv = Pyenv::new(
        manifest.python.resolved_pyenv_root(&env.home),
        &manifest.python.version,
    );
    if let Some(url) = &manifest.python.installer_url {
        pyenv = pyenv.with_installer_url(url);
    }
    steps.push(Step {
        name: "pyenv",
        critical: true,
        run: Box::new(move |env| {
            // Activation is unconditional: profile lines are idempotent
            // and later steps need the PATH model either way.
            pyenv.activate(env)?;
            guarded_install(&pyenv, env)
        }),
    });

    let mut poetry = Poetry::new(&manifest.poetry.version, manifest.poetry.force_latest);
    if let Some(url) = &manifest.poetry.installer_url {
        poetry = poetry.with_installer_url(url);
    }
    steps.push(Step {
        name: "poetry",
        critical: true,
        run: Box::new(move |env| {
            let local_bin = env.home.join(".local").join("bin");
            env.prepend_path(&local_bin);
            guarded_install(&poetry, env)
        }),
    });

    let project_dirs = manifest.expanded_projects();
    steps.push(Step {
        name: "project-environments",
        critical: false,
        run: Box::new(move |env| {
            let outcomes = projects::configure_all(&project_dirs, env);
            let configured = outcomes
                .iter()
                .filter(|o| o.status == ProjectStatus::Configured)
                .count();
            let failed = outcomes
                .iter()
                .filter(|o| matches!(o.status, ProjectStatus::Failed(_)))
                .count();
            let skipped = outcomes.len() - configured - failed;
            Ok(StepOutcome::Done(format!(
                "{} configured, {} skipped, {} failed",
                configured, skipped, failed
            )))
        }),
    });

    let node = NodeRuntime::new(&manifest.node.globals);
    steps.push(Step {
        name: "node",
        critical: false,
        run: Box::new(move |env| guarded_install(&node, env)),
    });

    let report_manifest = manifest.clone();
    steps.push(Step {
        name: "version-report",
        critical: false,
        run: Box::new(move |env| {
            let entries = collect_versions(&report_manifest, env);
            println!("{}", render_text(&entries));
            Ok(StepOutcome::Done(format!("{} tools", entries.len())))
        }),
    });

    let vendor = VendorCli::new(&manifest.vendor);
    steps.push(Step {
        name: "vendor-cli",
        critical: false,
        run: Box::new(move |env| {
            let mut install_error = None;

            if vendor.is_present(env) {
                if let Err(e) = vendor.update(env) {
                    tracing::warn!("Vendor CLI update failed: {}", e);
                }
            } else if let Err(e) = vendor.install(env) {
                install_error = Some(e);
            }

            // PATH line and settings merge happen even when the install
            // did not, so a later manual install finds them in place.
            vendor.configure(env)?;

            let checked = if vendor.is_present(env) {
                Some(vendor.self_check(env))
            } else {
                None
            };

            if let Some(e) = install_error {
                return Err(e);
            }

            Ok(StepOutcome::Done(match checked {
                Some(true) => "self-check passed".to_string(),
                Some(false) => "self-check failed".to_string(),
                None => "binary unavailable".to_string(),
            }))
        }),
    });

    steps
}
