// ABOUTME: Stack definition rendering for tenant stores.
// ABOUTME: StackRenderer is the seam; ComposeRenderer emits a compose file.

mod compose;

pub use compose::ComposeRenderer;

use crate::tenant::Tenant;

/// Service name of the database inside every rendered stack.
pub const DATABASE_SERVICE: &str = "db";
/// Service name of the storefront inside every rendered stack.
pub const APPLICATION_SERVICE: &str = "shop";
/// Port the storefront listens on inside its container.
pub const APPLICATION_CONTAINER_PORT: u16 = 80;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to serialize stack definition: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Turns a tenant into stack definition text. Implementations are pure.
pub trait StackRenderer: Send + Sync {
    fn render(&self, tenant: &Tenant) -> Result<String, RenderError>;
}
