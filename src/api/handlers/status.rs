// ABOUTME: Progress lookup for a tenant's provisioning run.

use crate::api::error::{ApiError, Result};
use crate::api::routes::AppState;
use crate::probe::HttpProbe;
use crate::progress::ProgressRecord;
use crate::runtime::ContainerRuntime;
use crate::types::TenantId;
use axum::{
    Json,
    extract::{Path, State},
};

/// Unknown, malformed and expired ids all answer 404.
pub async fn get_status<R, H>(
    State(state): State<AppState<R, H>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<ProgressRecord>>
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let not_found = || ApiError::NotFound(format!("no provisioning run for '{tenant_id}'"));
    let id = TenantId::parse(&tenant_id).map_err(|_| not_found())?;
    let record = state.provisioner.progress().get(id).ok_or_else(not_found)?;
    Ok(Json(ProgressRecord::clone(&record)))
}
