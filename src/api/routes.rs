// ABOUTME: Router construction and shared state for the provisioning API.
// ABOUTME: Every handler reaches the provisioner through AppState.

use super::handlers::{health, status, stores};
use crate::probe::HttpProbe;
use crate::provision::Provisioner;
use crate::runtime::ContainerRuntime;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub struct AppState<R, H: ?Sized> {
    pub provisioner: Arc<Provisioner<R, H>>,
}

impl<R, H: ?Sized> Clone for AppState<R, H> {
    fn clone(&self) -> Self {
        Self {
            provisioner: Arc::clone(&self.provisioner),
        }
    }
}

pub fn create_router<R, H>(provisioner: Arc<Provisioner<R, H>>) -> Router
where
    R: ContainerRuntime + 'static,
    H: HttpProbe + ?Sized + 'static,
{
    let state = AppState { provisioner };

    Router::new()
        .route("/health", get(health::health_check))
        .route("/create-store", post(stores::create_store::<R, H>))
        .route("/stores", post(stores::start_store::<R, H>))
        .route(
            "/stores/{tenant_id}",
            axum::routing::delete(stores::delete_store::<R, H>),
        )
        .route(
            "/stores/{tenant_id}/redeploy",
            post(stores::redeploy_store::<R, H>),
        )
        .route("/status/{tenant_id}", get(status::get_status::<R, H>))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
