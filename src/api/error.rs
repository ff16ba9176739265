// ABOUTME: API error type and its JSON response mapping.
// ABOUTME: Bodies are {"error", "kind", "tenant_id"?} with a status per error kind.

use crate::provision::{ProvisionError, ProvisionErrorKind};
use crate::types::TenantId;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error("{error}")]
    Provision {
        tenant_id: Option<TenantId>,
        #[source]
        error: ProvisionError,
    },
}

impl ApiError {
    pub fn provision(tenant_id: Option<TenantId>, error: ProvisionError) -> Self {
        ApiError::Provision { tenant_id, error }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Provision { error, .. } => match error.kind() {
                ProvisionErrorKind::AllocationExhausted => StatusCode::SERVICE_UNAVAILABLE,
                ProvisionErrorKind::LaunchFailed => StatusCode::INTERNAL_SERVER_ERROR,
                ProvisionErrorKind::DependencyTimedOut => StatusCode::GATEWAY_TIMEOUT,
                ProvisionErrorKind::UnknownTenant => StatusCode::NOT_FOUND,
                ProvisionErrorKind::TenantBusy => StatusCode::CONFLICT,
                ProvisionErrorKind::Workspace | ProvisionErrorKind::Runtime => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl From<ProvisionError> for ApiError {
    fn from(error: ProvisionError) -> Self {
        ApiError::Provision {
            tenant_id: None,
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(message) => json!({
                "error": message,
                "kind": "bad_request",
            }),
            ApiError::NotFound(message) => json!({
                "error": message,
                "kind": "not_found",
            }),
            ApiError::Internal(message) => {
                tracing::error!("request failed: {}", message);
                json!({
                    "error": message,
                    "kind": "internal",
                })
            }
            ApiError::Provision { tenant_id, error } => {
                if status.is_server_error() {
                    tracing::error!(tenant = ?tenant_id, "provisioning request failed: {}", error);
                }
                let mut body = json!({
                    "error": error.to_string(),
                    "kind": error.kind(),
                });
                if let Some(id) = tenant_id {
                    body["tenant_id"] = json!(id);
                }
                body
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
