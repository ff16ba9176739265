// ABOUTME: Runs a short command inside a tenant container and collects its output.
// ABOUTME: Admin folder discovery lists the storefront's document root through this.

use super::shared_types::{ExecConfig, ExecResult};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ExecOps: Send + Sync {
    /// Run `config.cmd` in `container` and wait for it to exit.
    ///
    /// Stdout and stderr are buffered whole into the [`ExecResult`]; a
    /// non-zero exit is a result, not an error. With `config.timeout` set
    /// the whole exec, output collection included, is abandoned after that
    /// long with [`ExecError::TimedOut`].
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError>;
}

/// Why no exit code came back.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("no such container: {0}")]
    ContainerNotFound(String),

    /// The storefront container exists but is stopped or restarting.
    #[error("container is not running: {0}")]
    ContainerNotRunning(String),

    #[error("command still running after {0:?}")]
    TimedOut(Duration),

    /// The output stream broke off before the command exited.
    #[error("output stream failed: {0}")]
    Failed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
