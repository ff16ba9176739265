// ABOUTME: Request and response bodies for the provisioning API.

use crate::types::{AdminCredentials, TenantId};
use serde::{Deserialize, Serialize};

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CreateStoreRequest {
    /// Both fields are required; their content is otherwise opaque.
    pub fn into_credentials(self) -> Result<AdminCredentials, ApiError> {
        if self.email.trim().is_empty() {
            return Err(ApiError::BadRequest("email is required".into()));
        }
        if self.password.is_empty() {
            return Err(ApiError::BadRequest("password is required".into()));
        }
        Ok(AdminCredentials::new(self.email.trim(), self.password))
    }
}

/// Reply to an asynchronous provisioning or redeploy request.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub tenant_id: TenantId,
    pub port: u16,
    pub status_url: String,
}

impl AcceptedResponse {
    pub fn new(tenant_id: TenantId, port: u16) -> Self {
        Self {
            tenant_id,
            port,
            status_url: format!("/status/{tenant_id}"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeardownResponse {
    pub tenant_id: TenantId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
