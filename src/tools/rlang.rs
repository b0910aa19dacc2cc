//! R runtime and R package installation.
//!
//! The runtime comes from the OS package manager. Packages are installed
//! through a generated `Rscript` expression that only touches packages
//! not already present, so the step is idempotent on the R side as well.

use crate::error::{CairnError, Result};
use crate::provision::ExecEnv;
use crate::shell::{execute, execute_check};
use crate::tools::apt::sudo_prefix;
use crate::tools::Tool;

/// CRAN mirror used for package installs.
const CRAN_REPO: &str = "https://cloud.r-project.org";

/// The R runtime plus its configured package set.
pub struct RRuntime {
    packages: Vec<String>,
}

impl RRuntime {
    pub fn new(packages: &[String]) -> Self {
        Self {
            packages: packages.to_vec(),
        }
    }

    /// R vector literal for the configured package names.
    fn package_vector(&self) -> String {
        let quoted: Vec<String> = self
            .packages
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect();
        format!("c({})", quoted.join(", "))
    }

    /// Expression that exits non-zero when any configured package is missing.
    fn check_expression(&self) -> String {
        format!(
            "missing <- setdiff({}, rownames(installed.packages())); quit(status = length(missing))",
            self.package_vector()
        )
    }

    /// Expression that installs only the missing packages.
    fn install_expression(&self) -> String {
        format!(
            "missing <- setdiff({}, rownames(installed.packages())); if (length(missing) > 0) install.packages(missing, repos = \"{}\")",
            self.package_vector(),
            CRAN_REPO
        )
    }

    fn packages_present(&self, env: &ExecEnv) -> bool {
        if self.packages.is_empty() {
            return true;
        }
        execute_check(
            &format!("Rscript -e '{}'", self.check_expression()),
            &env.command_options(),
        )
    }
}

impl Tool for RRuntime {
    fn name(&self) -> &str {
        "r"
    }

    fn is_present(&self, env: &ExecEnv) -> bool {
        env.lookup("R").is_some() && self.packages_present(env)
    }

    fn install(&self, env: &mut ExecEnv) -> Result<()> {
        if env.lookup("R").is_none() {
            tracing::info!("Installing R runtime");
            let command = format!("{}apt-get install -y r-base", sudo_prefix(env));
            let result = execute(&command, &env.command_options())?;
            if !result.success {
                return Err(CairnError::CommandFailed {
                    command,
                    code: result.exit_code,
                });
            }
        }

        if self.packages.is_empty() {
            return Ok(());
        }

        tracing::info!("Installing missing R packages: {}", self.packages.join(", "));
        let command = format!("Rscript -e '{}'", self.install_expression());
        let result = execute(&command, &env.command_options())?;
        if !result.success {
            return Err(CairnError::CommandFailed {
                command,
                code: result.exit_code,
            });
        }

        // install.packages reports build failures as warnings, so verify.
        if !self.packages_present(env) {
            return Err(CairnError::Other(anyhow::anyhow!(
                "R packages still missing after install"
            )));
        }

        Ok(())
    }

    fn version_string(&self, env: &ExecEnv) -> Option<String> {
        let result = execute("R --version", &env.command_options()).ok()?;
        if result.success {
            result.stdout.lines().next().map(|l| l.trim().to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn runtime(packages: &[&str]) -> RRuntime {
        RRuntime::new(
            &packages
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
        )
    }

    #[test]
    fn package_vector_quotes_names() {
        let tool = runtime(&["renv", "data.table"]);
        assert_eq!(tool.package_vector(), "c(\"renv\", \"data.table\")");
    }

    #[test]
    fn check_expression_exits_with_missing_count() {
        let tool = runtime(&["renv"]);
        let expr = tool.check_expression();
        assert!(expr.contains("setdiff(c(\"renv\")"));
        assert!(expr.contains("quit(status = length(missing))"));
    }

    #[test]
    fn install_expression_targets_only_missing() {
        let tool = runtime(&["renv", "devtools"]);
        let expr = tool.install_expression();
        assert!(expr.contains("if (length(missing) > 0)"));
        assert!(expr.contains("install.packages(missing"));
        assert!(expr.contains(CRAN_REPO));
    }

    #[test]
    fn absent_runtime_is_not_present() {
        let tool = runtime(&["renv"]);
        let env = ExecEnv::with_home(Path::new("/tmp"));
        assert!(!tool.is_present(&env));
    }

    #[test]
    fn empty_package_set_is_present_when_runtime_exists() {
        use std::fs;

        let temp = tempfile::TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let r = bin.join("R");
        fs::write(&r, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&r, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let mut env = ExecEnv::with_home(temp.path());
        env.prepend_path(&bin);

        let tool = runtime(&[]);
        assert!(tool.is_present(&env));
    }
}
