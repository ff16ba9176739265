// ABOUTME: Application-wide error types for shopstack.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::probe::ProbeError;
use crate::provision::ProvisionError;
use crate::runtime::RuntimeError;
use crate::types::TenantIdError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid tenant id: {0}")]
    InvalidTenant(#[from] TenantIdError),

    #[error("container runtime unavailable: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("HTTP client setup failed: {0}")]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
