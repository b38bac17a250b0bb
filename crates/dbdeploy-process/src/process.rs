use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;

use crate::command::CommandLine;
use crate::{ProcessError, Result};

// ─── ProcessRunner ────────────────────────────────────────────────────────

/// Runs one command line to completion.
///
/// Implementations return `Ok(())` only for a zero exit status. The
/// dispatcher depends on this trait rather than on [`TokioRunner`] so tests
/// can record invocations without spawning anything.
pub trait ProcessRunner {
    fn run(&self, command: &CommandLine) -> impl Future<Output = Result<()>> + Send;
}

// ─── TokioRunner ──────────────────────────────────────────────────────────

/// Spawns real child processes via `tokio::process`.
///
/// stdin is closed; stdout and stderr are inherited so the tool's own output
/// streams straight to the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl ProcessRunner for TokioRunner {
    async fn run(&self, command: &CommandLine) -> Result<()> {
        let argv = command.argv()?;
        let program = command.program().display().to_string();

        tracing::debug!(%command, "spawning");

        let status = Command::new(command.program())
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(ProcessError::Failed { program, code }),
            // Killed by signal (Unix)
            None => Err(ProcessError::Terminated { program }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable shell script that appends its argv (one per line)
    /// to `argv.log` and exits with `code`.
    fn fake_tool(dir: &TempDir, code: i32) -> std::path::PathBuf {
        let log = dir.path().join("argv.log");
        let script = dir.path().join("tool.sh");
        let body = format!(
            "#!/bin/sh\nfor a in \"$@\"; do printf '%s\\n' \"$a\" >> '{}'; done\nexit {code}\n",
            log.display()
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[tokio::test]
    async fn zero_exit_is_success_and_argv_is_split() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(&dir, 0);

        let cmd = CommandLine::new(&tool, r#"-S srv -U "a b" -i "x.sql""#);
        TokioRunner.run(&cmd).await.unwrap();

        let logged = std::fs::read_to_string(dir.path().join("argv.log")).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        assert_eq!(lines, vec!["-S", "srv", "-U", "a b", "-i", "x.sql"]);
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure_with_code() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(&dir, 3);

        let err = TokioRunner
            .run(&CommandLine::new(&tool, "-b"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: 3, .. }));
    }

    #[tokio::test]
    async fn killed_by_signal_is_terminated() {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("killed.sh");
        std::fs::write(&tool, "#!/bin/sh\nkill -9 $$\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = TokioRunner
            .run(&CommandLine::new(&tool, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Terminated { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let dir = TempDir::new().unwrap();
        let err = TokioRunner
            .run(&CommandLine::new(dir.path().join("nope"), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
