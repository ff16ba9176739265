// ABOUTME: Error types for tenant provisioning.
// ABOUTME: ProvisionErrorKind gives callers a stable category for status mapping.

use crate::runtime::ContainerError;
use crate::stack::RenderError;
use crate::types::TenantId;
use serde::Serialize;
use std::fmt;

/// A dependency the pipeline waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    Database,
    Application,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Database => write!(f, "database"),
            Dependency::Application => write!(f, "application"),
        }
    }
}

/// Errors that end a provisioning run.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Every candidate port was published by a container or bound on the host.
    #[error("no free port between {base} and {last}")]
    AllocationExhausted { base: u16, last: u16 },

    /// The runtime rejected the stack or `up` did not finish in time.
    #[error("stack launch failed: {stderr}")]
    LaunchFailed { stderr: String },

    /// A dependency never reported healthy within its attempt budget.
    #[error("{dependency} not healthy after {attempts} attempts")]
    DependencyTimedOut {
        dependency: Dependency,
        attempts: u32,
    },

    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    /// Another run for the same tenant has not finished.
    #[error("tenant {0} has a provisioning run in progress")]
    TenantBusy(TenantId),

    #[error("tenant workspace error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("container runtime error: {0}")]
    Runtime(String),
}

/// Stable error categories for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionErrorKind {
    AllocationExhausted,
    LaunchFailed,
    DependencyTimedOut,
    UnknownTenant,
    TenantBusy,
    Workspace,
    Runtime,
}

impl ProvisionError {
    pub fn kind(&self) -> ProvisionErrorKind {
        match self {
            ProvisionError::AllocationExhausted { .. } => ProvisionErrorKind::AllocationExhausted,
            ProvisionError::LaunchFailed { .. } => ProvisionErrorKind::LaunchFailed,
            ProvisionError::DependencyTimedOut { .. } => ProvisionErrorKind::DependencyTimedOut,
            ProvisionError::UnknownTenant(_) => ProvisionErrorKind::UnknownTenant,
            ProvisionError::TenantBusy(_) => ProvisionErrorKind::TenantBusy,
            ProvisionError::Workspace(_) | ProvisionError::Render(_) => {
                ProvisionErrorKind::Workspace
            }
            ProvisionError::Runtime(_) => ProvisionErrorKind::Runtime,
        }
    }
}

impl From<ContainerError> for ProvisionError {
    fn from(err: ContainerError) -> Self {
        ProvisionError::Runtime(err.to_string())
    }
}
