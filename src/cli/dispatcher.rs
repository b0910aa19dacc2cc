//! Subcommand dispatch.

use clap::CommandFactory;

use crate::cli::args::{Cli, Commands, RunArgs, VersionsArgs};
use crate::config::Manifest;
use crate::error::Result;
use crate::provision::{collect_versions, render_json, render_text, run_sequence, ExecEnv, RunOptions};
use crate::tools::vendor::VendorCli;
use crate::ui::Reporter;

/// Routes parsed arguments to the library entry points.
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Dispatch the invocation; returns the process exit code.
    pub fn dispatch(cli: &Cli, reporter: &mut Reporter) -> Result<i32> {
        let mut manifest = Self::load_manifest(cli)?;
        manifest.apply_overrides(&cli.overrides());

        match &cli.command {
            Some(Commands::Run(args)) => Self::run(&manifest, args, reporter),
            None => Self::run(&manifest, &RunArgs::default(), reporter),
            Some(Commands::Versions(args)) => Self::versions(&manifest, args),
            Some(Commands::Config) => {
                print!("{}", manifest.to_yaml()?);
                Ok(0)
            }
            Some(Commands::Doctor) => Self::doctor(&manifest),
            Some(Commands::Completions(args)) => {
                let mut command = Cli::command();
                clap_complete::generate(args.shell, &mut command, "cairn", &mut std::io::stdout());
                Ok(0)
            }
        }
    }

    fn load_manifest(cli: &Cli) -> Result<Manifest> {
        let (manifest, source) = Manifest::load(cli.manifest.as_deref())?;
        match &source {
            Some(path) => tracing::debug!("Loaded manifest from {}", path.display()),
            None => tracing::debug!("No manifest found; using built-in defaults"),
        }
        Ok(manifest)
    }

    fn run(manifest: &Manifest, args: &RunArgs, reporter: &mut Reporter) -> Result<i32> {
        let options = RunOptions {
            dry_run: args.dry_run,
            only: args.only.clone(),
            skip: args.skip.clone(),
        };

        let mut env = ExecEnv::from_system();
        let summary = run_sequence(manifest, &mut env, &options, reporter)?;
        reporter.summary(&summary.reports, summary.duration);

        // Optional-step failures are reported but do not change the
        // exit code; only a critical failure (an Err above) does.
        Ok(0)
    }

    fn versions(manifest: &Manifest, args: &VersionsArgs) -> Result<i32> {
        let env = ExecEnv::from_system();
        let entries = collect_versions(manifest, &env);

        if args.json {
            println!("{}", render_json(&entries));
        } else {
            println!("{}", render_text(&entries));
        }
        Ok(0)
    }

    fn doctor(manifest: &Manifest) -> Result<i32> {
        let env = ExecEnv::from_system();
        let vendor = VendorCli::new(&manifest.vendor);
        Ok(if vendor.self_check(&env) { 0 } else { 1 })
    }
}
