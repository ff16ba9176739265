// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Tenant identities, runtime ids, and redacting admin credentials.

mod credentials;
mod id;
mod tenant_id;

pub use credentials::AdminCredentials;
pub use id::{ContainerId, ExecId};
pub use tenant_id::{TenantId, TenantIdError};
