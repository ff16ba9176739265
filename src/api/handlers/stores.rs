// ABOUTME: Store provisioning handlers: synchronous and background creation,
// ABOUTME: redeploy of an existing tenant, and teardown.

use crate::api::dto::{AcceptedResponse, CreateStoreRequest, TeardownResponse};
use crate::api::error::{ApiError, Result};
use crate::api::routes::AppState;
use crate::probe::HttpProbe;
use crate::provision::{PreparedRun, Provisioner, StoreReport};
use crate::runtime::ContainerRuntime;
use crate::types::{AdminCredentials, TenantId};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

/// Body extraction with rejections routed through [`ApiError`].
type Payload = std::result::Result<Json<CreateStoreRequest>, JsonRejection>;

fn credentials(payload: Payload) -> Result<AdminCredentials> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.into_credentials()
}

fn tenant_id(raw: &str) -> Result<TenantId> {
    TenantId::parse(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid tenant id '{raw}': {e}")))
}

/// Run the pipeline in the background; its outcome lands in the progress tracker.
fn spawn_run<R, H>(provisioner: Arc<Provisioner<R, H>>, prepared: PreparedRun)
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    tokio::spawn(async move {
        let id = prepared.id;
        if let Err(e) = provisioner.run(prepared).await {
            tracing::warn!(tenant = %id, error = %e, "background provisioning failed");
        }
    });
}

async fn provision_store<R, H>(
    provisioner: Arc<Provisioner<R, H>>,
    credentials: AdminCredentials,
) -> Result<StoreReport>
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let prepared = provisioner.prepare(credentials).await?;
    let id = prepared.id;
    provisioner
        .run(prepared)
        .await
        .map_err(|e| ApiError::provision(Some(id), e))
}

/// POST /create-store: provision and wait for the report.
///
/// The run lives in its own task, so a client that disconnects does not
/// stop it halfway; the outcome still reaches the progress tracker.
pub async fn create_store<R, H>(
    State(state): State<AppState<R, H>>,
    payload: Payload,
) -> Result<(StatusCode, Json<StoreReport>)>
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let credentials = credentials(payload)?;
    let task = tokio::spawn(provision_store(Arc::clone(&state.provisioner), credentials));

    let report = task
        .await
        .map_err(|e| ApiError::Internal(format!("provisioning task failed: {e}")))??;

    let status = if report.is_pending() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}

/// POST /stores: allocate, answer immediately, provision in the background.
pub async fn start_store<R, H>(
    State(state): State<AppState<R, H>>,
    payload: Payload,
) -> Result<(StatusCode, Json<AcceptedResponse>)>
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let credentials = credentials(payload)?;
    let prepared = state.provisioner.prepare(credentials).await?;
    let response = AcceptedResponse::new(prepared.id, prepared.port);

    spawn_run(Arc::clone(&state.provisioner), prepared);
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /stores/{tenant_id}/redeploy
pub async fn redeploy_store<R, H>(
    State(state): State<AppState<R, H>>,
    Path(raw): Path<String>,
    payload: Payload,
) -> Result<(StatusCode, Json<AcceptedResponse>)>
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let id = tenant_id(&raw)?;
    let credentials = credentials(payload)?;
    let prepared = state
        .provisioner
        .prepare_existing(id, credentials)
        .await
        .map_err(|e| ApiError::provision(Some(id), e))?;
    let response = AcceptedResponse::new(prepared.id, prepared.port);

    spawn_run(Arc::clone(&state.provisioner), prepared);
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// DELETE /stores/{tenant_id}
pub async fn delete_store<R, H>(
    State(state): State<AppState<R, H>>,
    Path(raw): Path<String>,
) -> Result<Json<TeardownResponse>>
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let id = tenant_id(&raw)?;
    let warnings = state
        .provisioner
        .teardown(id)
        .await
        .map_err(|e| ApiError::provision(Some(id), e))?;

    Ok(Json(TeardownResponse {
        tenant_id: id,
        status: "removed",
        warnings,
    }))
}
