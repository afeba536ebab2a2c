//! Running external programs with a deadline.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// What an external program printed and how it exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the program exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `program` with `args`, capturing its output.
///
/// The child is killed if it outlives `timeout`.
///
/// # Errors
///
/// Returns [`Error::CommandSpawn`] if the program cannot be started (use
/// [`Error::is_missing_program`] to detect "not installed") and
/// [`Error::Timeout`] if it does not finish in time.
pub async fn run<S: AsRef<str>>(
    program: &str,
    args: &[S],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput> {
    let mut command = Command::new(program);
    command
        .args(args.iter().map(AsRef::<str>::as_ref))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|source| Error::CommandSpawn {
        program: program.to_string(),
        source,
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::Timeout {
            operation: describe(program, args),
        })??;

    debug!(program, code = ?output.status.code(), "command finished");
    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Render a command line for messages.
#[must_use]
pub fn describe<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(AsRef::as_ref))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(describe("bash", &["-n", "setup.sh"]), "bash -n setup.sh");
        assert_eq!(describe::<&str>("docker-compose", &[]), "docker-compose");
    }

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(!CommandOutput { code: None, ..ok.clone() }.success());
        assert!(!CommandOutput { code: Some(2), ..ok }.success());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run::<&str>(
            "definitely-not-an-installed-program",
            &[],
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(err.is_missing_program());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_and_code() {
        let out = run(
            "sh",
            &["-c", "echo hello; echo oops >&2; exit 3"],
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let err = run("sleep", &["5"], None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
