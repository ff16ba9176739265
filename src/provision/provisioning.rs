// ABOUTME: Generic provisioning run parameterized by state marker.
// ABOUTME: The tenant and collected warnings travel with the run through every state.

use crate::diagnostics::Diagnostics;
use crate::tenant::Tenant;
use crate::types::TenantId;

use super::state::{Allocated, Finalized, Launched};
use super::AdminPath;

/// One tenant's pipeline, parameterized by its current state.
///
/// Transitions consume the run and return the next state, so a stage can
/// only be reached after the ones before it succeeded.
#[derive(Debug)]
pub struct Provisioning<S> {
    pub(crate) tenant: Tenant,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) state: S,
}

impl Provisioning<Allocated> {
    pub fn new(tenant: Tenant) -> Self {
        Provisioning {
            tenant,
            diagnostics: Diagnostics::default(),
            state: Allocated,
        }
    }
}

impl<S> Provisioning<S> {
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant.id
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl Provisioning<Launched> {
    pub fn stack_path(&self) -> std::path::PathBuf {
        self.state.stack.path()
    }
}

impl Provisioning<Finalized> {
    pub fn admin_path(&self) -> &AdminPath {
        &self.state.admin
    }
}
