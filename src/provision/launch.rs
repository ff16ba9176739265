// ABOUTME: Writes a tenant's stack definition and brings it up through the runtime.
// ABOUTME: Tears down any stale stack for the same identity first.

use super::ProvisionError;
use crate::config::LaunchConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ContainerOps, StackError, StackFile, StackOps, StackOutput};
use crate::stack::StackRenderer;
use crate::tenant::Tenant;
use crate::types::TenantId;
use std::path::Path;

/// Outcome of a successful `up`.
#[derive(Debug, Clone)]
pub struct LaunchResult {
    pub stack: StackFile,
    pub output: StackOutput,
}

pub struct StackLauncher<'a, R: ?Sized> {
    runtime: &'a R,
    renderer: &'a dyn StackRenderer,
    config: LaunchConfig,
}

impl<'a, R> StackLauncher<'a, R>
where
    R: ContainerOps + StackOps + ?Sized,
{
    pub fn new(runtime: &'a R, renderer: &'a dyn StackRenderer, config: LaunchConfig) -> Self {
        Self {
            runtime,
            renderer,
            config,
        }
    }

    /// Remove whatever an earlier run left behind for `id`.
    ///
    /// Runs `down` when a definition exists in `dir`, then stops and removes
    /// the named containers. Missing containers are fine; other failures
    /// become warnings so a fresh launch can still be attempted.
    pub async fn teardown(&self, id: TenantId, dir: &Path, diagnostics: &mut Diagnostics) {
        let stack = StackFile::new(id.project_name(), dir);

        if stack.path().exists() {
            match self
                .runtime
                .stack_down(&stack, self.config.teardown_timeout)
                .await
            {
                Ok(_) => tracing::debug!(tenant = %id, "previous stack brought down"),
                Err(e) => diagnostics.warn(Warning::teardown_incomplete(format!(
                    "{id}: compose down failed: {e}"
                ))),
            }
        }

        for container in id.containers() {
            match self
                .runtime
                .stop_container(&container, self.config.teardown_timeout)
                .await
            {
                Ok(()) => tracing::debug!(container = %container, "stopped stale container"),
                Err(e) if e.is_absent() => {}
                Err(e) => diagnostics.warn(Warning::teardown_incomplete(format!(
                    "{container}: stop failed: {e}"
                ))),
            }

            match self.runtime.remove_container(&container, true).await {
                Ok(()) => tracing::debug!(container = %container, "removed stale container"),
                Err(e) if e.is_absent() => {}
                Err(e) => diagnostics.warn(Warning::teardown_incomplete(format!(
                    "{container}: remove failed: {e}"
                ))),
            }
        }
    }

    /// Tear down, render, persist and start the tenant's stack.
    pub async fn launch(
        &self,
        tenant: &Tenant,
        diagnostics: &mut Diagnostics,
    ) -> Result<LaunchResult, ProvisionError> {
        self.teardown(tenant.id, &tenant.dir, diagnostics).await;

        let definition = self.renderer.render(tenant)?;
        let stack = tenant.stack_file();
        tokio::fs::create_dir_all(stack.dir()).await?;
        tokio::fs::write(stack.path(), definition).await?;
        tracing::debug!(tenant = %tenant.id, path = %stack.path().display(), "stack definition written");

        let output = self
            .runtime
            .stack_up(&stack, self.config.timeout)
            .await
            .map_err(|e| ProvisionError::LaunchFailed {
                stderr: launch_stderr(&e),
            })?;

        Ok(LaunchResult { stack, output })
    }
}

fn launch_stderr(err: &StackError) -> String {
    let stderr = err.stderr();
    if stderr.trim().is_empty() {
        err.to_string()
    } else {
        stderr.trim().to_string()
    }
}
