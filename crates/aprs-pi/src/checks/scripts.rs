//! Shell and Python script checks.

use std::path::Path;

use async_trait::async_trait;

use super::{CheckContext, CheckOutcome, ProjectCheck};
use crate::process;

const HEALTH_CHECK_SCRIPT: &str = "scripts/health-check.sh";

/// Parses a Python file without writing bytecode.
const PY_PARSE: &str = "import ast, sys; ast.parse(open(sys.argv[1]).read(), sys.argv[1])";

/// Every `scripts/*.sh` is executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptPermissions;

#[cfg(unix)]
async fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::metadata(path)
        .await
        .is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

// No execute bit to check
#[cfg(not(unix))]
async fn is_executable(_path: &Path) -> bool {
    true
}

#[async_trait]
impl ProjectCheck for ScriptPermissions {
    fn name(&self) -> &'static str {
        "script-permissions"
    }

    fn description(&self) -> &'static str {
        "shell scripts have execute permission"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let mut problems = Vec::new();
        for script in ctx.scripts_with_extension("sh").await {
            if !is_executable(&script).await {
                problems.push(format!("Script {} is not executable", ctx.display(&script)));
            }
        }
        CheckOutcome::from_problems(problems)
    }
}

/// Run a syntax checker over each script, collecting failures.
async fn check_each(
    ctx: &CheckContext,
    program: &str,
    leading_args: &[&str],
    scripts: Vec<std::path::PathBuf>,
) -> CheckOutcome {
    let mut problems = Vec::new();
    for script in scripts {
        let mut args: Vec<String> = leading_args.iter().map(ToString::to_string).collect();
        // The child runs in the root, so hand it a root-relative path
        args.push(ctx.relative(&script).display().to_string());

        match process::run(program, &args, Some(ctx.root()), ctx.script_timeout()).await {
            Ok(output) if output.success() => {}
            Ok(output) => problems.push(format!(
                "Syntax error in {}: {}",
                ctx.display(&script),
                output.stderr.trim()
            )),
            Err(err) => match CheckOutcome::from_command_error(&err) {
                skip @ CheckOutcome::Skipped { .. } => return skip,
                _ => problems.push(format!(
                    "Syntax check failed for {}: {err}",
                    ctx.display(&script)
                )),
            },
        }
    }
    CheckOutcome::from_problems(problems)
}

/// `bash -n` accepts every `scripts/*.sh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSyntax;

#[async_trait]
impl ProjectCheck for ScriptSyntax {
    fn name(&self) -> &'static str {
        "script-syntax"
    }

    fn description(&self) -> &'static str {
        "bash -n accepts every shell script"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        check_each(ctx, "bash", &["-n"], ctx.scripts_with_extension("sh").await).await
    }
}

/// Python parses every `scripts/*.py`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonSyntax;

#[async_trait]
impl ProjectCheck for PythonSyntax {
    fn name(&self) -> &'static str {
        "python-syntax"
    }

    fn description(&self) -> &'static str {
        "python3 parses every Python script"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let scripts = ctx.scripts_with_extension("py").await;
        if scripts.is_empty() {
            return CheckOutcome::Passed;
        }
        check_each(ctx, "python3", &["-c", PY_PARSE], scripts).await
    }
}

/// `scripts/health-check.sh` exits with 0 (healthy) or 1 (unhealthy).
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheckScript;

#[async_trait]
impl ProjectCheck for HealthCheckScript {
    fn name(&self) -> &'static str {
        "health-check-script"
    }

    fn description(&self) -> &'static str {
        "health-check.sh reports healthy or unhealthy"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        if tokio::fs::metadata(ctx.path(HEALTH_CHECK_SCRIPT)).await.is_err() {
            return CheckOutcome::Passed;
        }

        let args = [HEALTH_CHECK_SCRIPT];
        match process::run("bash", &args, Some(ctx.root()), ctx.command_timeout()).await {
            Ok(output) if matches!(output.code, Some(0 | 1)) => CheckOutcome::Passed,
            Ok(output) => CheckOutcome::failed(format!(
                "Health check script should return 0 (healthy) or 1 (unhealthy), got {:?}",
                output.code
            )),
            Err(err) => CheckOutcome::from_command_error(&err),
        }
    }
}
