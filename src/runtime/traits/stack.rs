// ABOUTME: Stack operations trait for multi-container definitions.
// ABOUTME: Brings a rendered compose project up or down with a bounded timeout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the persisted stack definition inside a tenant directory.
pub const STACK_FILE_NAME: &str = "docker-compose.yml";

/// A persisted stack definition and the project it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFile {
    /// Compose project name; scopes networks and volumes.
    pub project: String,
    /// Directory holding the definition; commands run from here.
    pub dir: PathBuf,
}

impl StackFile {
    pub fn new(project: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            dir: dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STACK_FILE_NAME)
    }

    pub fn file_name(&self) -> &'static str {
        STACK_FILE_NAME
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Captured output of a stack command.
#[derive(Debug, Clone, Default)]
pub struct StackOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Stack lifecycle operations.
#[async_trait]
pub trait StackOps: Send + Sync {
    /// Start every service of the stack in detached mode.
    async fn stack_up(&self, stack: &StackFile, timeout: Duration)
    -> Result<StackOutput, StackError>;

    /// Stop and remove the stack's containers, networks and volumes.
    async fn stack_down(
        &self,
        stack: &StackFile,
        timeout: Duration,
    ) -> Result<StackOutput, StackError>;
}

/// Errors from stack operations.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("stack command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("stack command timed out after {0:?}")]
    TimedOut(Duration),

    #[error("failed to spawn stack command: {0}")]
    Spawn(#[from] std::io::Error),
}

impl StackError {
    /// Diagnostic text suitable for surfacing to the caller.
    pub fn stderr(&self) -> String {
        match self {
            StackError::Failed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}
