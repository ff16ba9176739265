// ABOUTME: HTTP surface for provisioning: create stores, poll status, redeploy, tear down.
// ABOUTME: Built on axum with CORS and request tracing layers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, create_router};
