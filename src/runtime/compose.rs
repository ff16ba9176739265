// ABOUTME: Compose CLI driver implementing stack operations.
// ABOUTME: Runs `<runtime> compose -p <project> -f docker-compose.yml ...` with a timeout.

use crate::runtime::traits::{StackError, StackFile, StackOps, StackOutput};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Drives a compose front end (`docker compose`, `podman compose`, `docker-compose`).
#[derive(Debug, Clone)]
pub struct ComposeCli {
    program: String,
    args: Vec<String>,
}

impl ComposeCli {
    /// Build from a full invocation such as `["docker", "compose"]`.
    ///
    /// Falls back to `docker compose` when the list is empty.
    pub fn new(command: Vec<String>) -> Self {
        let mut parts = command.into_iter();
        match parts.next() {
            Some(program) => Self {
                program,
                args: parts.collect(),
            },
            None => Self {
                program: "docker".to_string(),
                args: vec!["compose".to_string()],
            },
        }
    }

    async fn run(
        &self,
        stack: &StackFile,
        action: &[&str],
        timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        tracing::debug!(
            project = %stack.project,
            dir = %stack.dir.display(),
            "running {} {} {}",
            self.program,
            self.args.join(" "),
            action.join(" ")
        );

        let child = Command::new(&self.program)
            .args(&self.args)
            .args(["-p", &stack.project, "-f", stack.file_name()])
            .args(action)
            .current_dir(&stack.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(StackError::TimedOut(timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(StackOutput { stdout, stderr })
        } else {
            Err(StackError::Failed {
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}

#[async_trait]
impl StackOps for ComposeCli {
    async fn stack_up(
        &self,
        stack: &StackFile,
        timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        self.run(stack, &["up", "-d"], timeout).await
    }

    async fn stack_down(
        &self,
        stack: &StackFile,
        timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        self.run(stack, &["down", "--volumes", "--remove-orphans"], timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ComposeCli {
        ComposeCli::new(vec!["sh".to_string(), "-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn up_passes_project_file_and_detach_flag() {
        let dir = tempfile::tempdir().unwrap();
        let stack = StackFile::new("tenant4", dir.path());

        let output = sh("echo \"$0 $@\"")
            .stack_up(&stack, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.stdout.trim(), "-p tenant4 -f docker-compose.yml up -d");
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let stack = StackFile::new("tenant1", dir.path());

        let err = sh("echo 'port is already allocated' >&2; exit 3")
            .stack_up(&stack, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::Failed { .. }));
        assert!(err.stderr().contains("port is already allocated"));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let stack = StackFile::new("tenant1", dir.path());

        let err = sh("sleep 5")
            .stack_down(&stack, Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::TimedOut(_)));
    }

    #[test]
    fn empty_command_falls_back_to_docker_compose() {
        let cli = ComposeCli::new(Vec::new());
        assert_eq!(cli.program, "docker");
        assert_eq!(cli.args, vec!["compose".to_string()]);
    }
}
