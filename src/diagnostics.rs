// ABOUTME: Diagnostics accumulator for non-fatal warnings during provisioning.
// ABOUTME: Also captures a best-effort container snapshot when a run fails.

use crate::runtime::{ContainerOps, ContainerState, HealthState, LogOps};
use crate::types::TenantId;
use serde::Serialize;

/// Collects non-fatal warnings during provisioning operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warning messages in the order they were recorded.
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }
}

/// A non-fatal warning collected during provisioning.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The installer's admin folder could not be found; the default is reported.
    pub fn admin_path_default(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::AdminPathDefault,
            message: message.into(),
        }
    }

    /// The storefront did not answer within its polling budget.
    pub fn application_slow(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ApplicationSlow,
            message: message.into(),
        }
    }

    /// Part of tearing down a previous stack failed.
    pub fn teardown_incomplete(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::TeardownIncomplete,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Admin folder discovery fell back to the default name.
    AdminPathDefault,
    /// Storefront still starting when polling gave up.
    ApplicationSlow,
    /// Stale stack or container could not be removed.
    TeardownIncomplete,
}

/// Recent log lines kept per container in a failure snapshot.
pub const SNAPSHOT_LOG_LINES: u64 = 50;

/// Container state at the moment a run failed.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSnapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ContainerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_logs: Vec<String>,
    /// Why part of the snapshot is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
}

/// Inspect both tenant containers and tail their logs.
///
/// Never fails: whatever cannot be collected is noted in `unavailable`
/// and logged at warn level.
pub async fn capture_failure_snapshot<R>(runtime: &R, tenant: TenantId) -> Vec<ContainerSnapshot>
where
    R: ContainerOps + LogOps + ?Sized,
{
    let mut snapshots = Vec::new();

    for container in tenant.containers() {
        let mut snapshot = ContainerSnapshot {
            name: container.to_string(),
            state: None,
            health: None,
            recent_logs: Vec::new(),
            unavailable: None,
        };

        match runtime.inspect_container(&container).await {
            Ok(info) => {
                snapshot.state = Some(info.state);
                snapshot.health = info.health;
            }
            Err(e) => {
                tracing::warn!(container = %container, error = %e, "diagnostics: inspect failed");
                snapshot.unavailable = Some(format!("inspect failed: {e}"));
                snapshots.push(snapshot);
                continue;
            }
        }

        match runtime.recent_logs(&container, SNAPSHOT_LOG_LINES).await {
            Ok(lines) => snapshot.recent_logs = lines,
            Err(e) => {
                tracing::warn!(container = %container, error = %e, "diagnostics: log tail failed");
                snapshot.unavailable = Some(format!("logs unavailable: {e}"));
            }
        }

        tracing::info!(
            container = %container,
            state = ?snapshot.state,
            health = ?snapshot.health,
            "diagnostics: container snapshot"
        );
        for line in &snapshot.recent_logs {
            tracing::debug!(container = %container, "{}", line);
        }

        snapshots.push(snapshot);
    }

    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::admin_path_default("admin folder not renamed"));
        diag.warn(Warning::teardown_incomplete("compose down failed"));

        assert!(diag.has_warnings());
        assert_eq!(
            diag.messages(),
            vec!["admin folder not renamed", "compose down failed"]
        );
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::admin_path_default("x").kind,
            WarningKind::AdminPathDefault
        );
        assert_eq!(
            Warning::application_slow("x").kind,
            WarningKind::ApplicationSlow
        );
        assert_eq!(
            Warning::teardown_incomplete("x").kind,
            WarningKind::TeardownIncomplete
        );
    }
}
