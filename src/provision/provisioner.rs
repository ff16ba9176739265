// ABOUTME: Orchestrates tenant provisioning from allocation to the final report.
// ABOUTME: Owns the shared collaborators and serializes identity and port assignment.

use super::claim::{Reservation, Reservations};
use super::error::ProvisionError;
use super::finalize::{DiscoveryStrategy, default_strategies};
use super::launch::StackLauncher;
use super::ports::{BindProbe, PortAllocator, default_bind_probe};
use super::provisioning::Provisioning;
use super::report::StoreReport;
use super::transitions::{ApplicationOutcome, Pipeline};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, capture_failure_snapshot};
use crate::probe::HttpProbe;
use crate::progress::{ProgressTracker, Stage};
use crate::runtime::ContainerRuntime;
use crate::stack::{ComposeRenderer, StackRenderer};
use crate::tenant::{Tenant, TenantDirectory};
use crate::types::{AdminCredentials, TenantId};
use serde_json::json;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Marks the tenant's progress record as interrupted if the run is dropped
/// before it records an outcome.
struct Interrupted {
    progress: ProgressTracker,
    id: TenantId,
}

impl Drop for Interrupted {
    fn drop(&mut self) {
        if self.progress.abandon(self.id, "Provisioning was interrupted") {
            tracing::warn!(tenant = %self.id, "provisioning run dropped before finishing");
        }
    }
}

/// A tenant ready to run, holding its port and identity until the run ends.
///
/// Dropping it, or dropping the future of [`Provisioner::run`], releases
/// both and fails the progress record if no outcome was recorded.
pub struct PreparedRun {
    tenant: Tenant,
    // Field order is drop order: the record is settled before the identity frees up.
    _interrupted: Interrupted,
    _port: Reservation<u16>,
    _identity: Reservation<TenantId>,
}

impl PreparedRun {
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }
}

impl Deref for PreparedRun {
    type Target = Tenant;

    fn deref(&self) -> &Tenant {
        &self.tenant
    }
}

impl fmt::Debug for PreparedRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRun")
            .field("tenant", &self.tenant.id)
            .field("port", &self.tenant.port)
            .finish()
    }
}

/// Runs provisioning pipelines against one runtime.
///
/// Cheap to share behind an `Arc`; each tenant's run is an independent
/// future. Only identity derivation plus port allocation is serialized.
pub struct Provisioner<R, H: ?Sized> {
    runtime: Arc<R>,
    probe: Arc<H>,
    renderer: Arc<dyn StackRenderer>,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
    progress: ProgressTracker,
    config: Config,
    tenants: TenantDirectory,
    public_host: String,
    allocation: tokio::sync::Mutex<()>,
    ports: Reservations<u16>,
    active: Reservations<TenantId>,
    bind_probe: BindProbe,
}

impl<R, H> Provisioner<R, H>
where
    R: ContainerRuntime,
    H: HttpProbe + ?Sized,
{
    pub fn new(
        runtime: Arc<R>,
        probe: Arc<H>,
        config: Config,
        public_host: impl Into<String>,
    ) -> Self {
        let public_host = public_host.into();
        let renderer = Arc::new(ComposeRenderer::new(
            config.stack.clone(),
            public_host.clone(),
        ));
        Self {
            runtime,
            probe,
            renderer,
            strategies: default_strategies(),
            progress: ProgressTracker::new(config.progress.retention),
            tenants: TenantDirectory::new(config.tenants_dir.clone()),
            config,
            public_host,
            allocation: tokio::sync::Mutex::new(()),
            ports: Reservations::new(),
            active: Reservations::new(),
            bind_probe: default_bind_probe(),
        }
    }

    pub fn with_bind_probe(mut self, bind_probe: BindProbe) -> Self {
        self.bind_probe = bind_probe;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn StackRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tenants(&self) -> &TenantDirectory {
        &self.tenants
    }

    pub fn public_host(&self) -> &str {
        &self.public_host
    }

    fn pipeline(&self) -> Pipeline<'_, R, H> {
        Pipeline {
            runtime: self.runtime.as_ref(),
            probe: self.probe.as_ref(),
            renderer: self.renderer.as_ref(),
            progress: &self.progress,
            config: &self.config,
            strategies: &self.strategies,
        }
    }

    /// Pick a port and reserve it. Callers hold the allocation lock.
    async fn allocate_port(&self) -> Result<Reservation<u16>, ProvisionError> {
        let port = PortAllocator::new(
            self.runtime.as_ref(),
            self.config.ports,
            Arc::clone(&self.bind_probe),
        )
        .with_reserved(self.ports.snapshot())
        .allocate()
        .await?;

        self.ports
            .try_reserve(port)
            .ok_or_else(|| ProvisionError::Runtime(format!("port {port} reserved concurrently")))
    }

    fn claim_identity(&self, id: TenantId) -> Result<Reservation<TenantId>, ProvisionError> {
        self.active
            .try_reserve(id)
            .ok_or(ProvisionError::TenantBusy(id))
    }

    fn interrupted(&self, id: TenantId) -> Interrupted {
        Interrupted {
            progress: self.progress.clone(),
            id,
        }
    }

    /// Whether a run for `id` is between prepare and its outcome.
    pub fn is_active(&self, id: TenantId) -> bool {
        self.active.is_held(id)
    }

    /// Assign a new identity and port for a store.
    pub async fn prepare(&self, credentials: AdminCredentials) -> Result<PreparedRun, ProvisionError> {
        let (port, id, dir) = {
            let _guard = self.allocation.lock().await;
            let port = self.allocate_port().await?;
            let (id, dir) = self.tenants.claim().await?;
            (port, id, dir)
        };
        let identity = self.claim_identity(id)?;

        tracing::info!(tenant = %id, port = port.value(), "tenant allocated");
        self.progress.begin(id, "Provisioning queued");
        let interrupted = self.interrupted(id);
        self.progress.update(
            id,
            Stage::AllocatingPort,
            format!("Assigned port {}", port.value()),
            10,
        );

        Ok(PreparedRun {
            tenant: self.tenant(id, dir, port.value(), credentials),
            _interrupted: interrupted,
            _port: port,
            _identity: identity,
        })
    }

    /// Re-provision an existing identity: tear down, then assign a fresh port.
    ///
    /// Fails with [`ProvisionError::TenantBusy`] while another run for the
    /// tenant is in flight.
    pub async fn prepare_existing(
        &self,
        id: TenantId,
        credentials: AdminCredentials,
    ) -> Result<PreparedRun, ProvisionError> {
        let dir = self
            .tenants
            .existing(id)
            .await
            .ok_or_else(|| ProvisionError::UnknownTenant(id.to_string()))?;
        let identity = self.claim_identity(id)?;

        self.progress.begin(id, "Redeploy queued");
        let interrupted = self.interrupted(id);
        let mut diagnostics = Diagnostics::default();
        self.launcher().teardown(id, &dir, &mut diagnostics).await;

        let port = {
            let _guard = self.allocation.lock().await;
            match self.allocate_port().await {
                Ok(port) => port,
                Err(e) => {
                    self.progress
                        .fail(id, e.to_string(), json!({"error": e.to_string(), "kind": e.kind()}));
                    return Err(e);
                }
            }
        };

        tracing::info!(tenant = %id, port = port.value(), "tenant reallocated");
        self.progress.update(
            id,
            Stage::AllocatingPort,
            format!("Assigned port {}", port.value()),
            10,
        );

        Ok(PreparedRun {
            tenant: self.tenant(id, dir, port.value(), credentials),
            _interrupted: interrupted,
            _port: port,
            _identity: identity,
        })
    }

    fn tenant(
        &self,
        id: TenantId,
        dir: std::path::PathBuf,
        port: u16,
        credentials: AdminCredentials,
    ) -> Tenant {
        Tenant {
            id,
            port,
            dir,
            credentials,
            admin_folder: self.config.stack.admin_folder.clone(),
        }
    }

    fn launcher(&self) -> StackLauncher<'_, R> {
        StackLauncher::new(self.runtime.as_ref(), self.renderer.as_ref(), self.config.launch)
    }

    /// Drive a prepared tenant through launch, readiness and finalization.
    ///
    /// The outcome is also recorded in the progress tracker. Fatal errors
    /// capture a container snapshot first. The port and identity stay
    /// reserved until this returns or its future is dropped.
    pub async fn run(&self, prepared: PreparedRun) -> Result<StoreReport, ProvisionError> {
        self.drive(prepared.tenant.clone()).await
    }

    async fn drive(&self, tenant: Tenant) -> Result<StoreReport, ProvisionError> {
        let ctx = self.pipeline();
        let id = tenant.id;

        let run = Provisioning::new(tenant);
        let run = match run.launch(&ctx).await {
            Ok(run) => run,
            Err((run, e)) => return Err(self.fail(run, e).await),
        };
        let run = match run.await_database(&ctx).await {
            Ok(run) => run,
            Err((run, e)) => return Err(self.fail(run, e).await),
        };

        let report = match run.await_application(&ctx).await {
            ApplicationOutcome::Ready(run) => run.finalize(&ctx).await.into_report(&self.public_host),
            ApplicationOutcome::Pending(run) => run.into_report(&self.public_host),
        };

        let payload = serde_json::to_value(&report).unwrap_or_default();
        self.progress.complete(id, report.message.clone(), payload);
        tracing::info!(
            tenant = %id,
            url = %report.url,
            admin_folder = %report.admin_folder,
            status = ?report.status,
            "provisioning finished"
        );
        Ok(report)
    }

    async fn fail<S>(&self, run: Provisioning<S>, error: ProvisionError) -> ProvisionError {
        let id = run.tenant_id();
        tracing::error!(tenant = %id, error = %error, "provisioning failed");

        let snapshot = capture_failure_snapshot(self.runtime.as_ref(), id).await;

        // A partial `up` can leave the database and its volumes behind.
        let mut warnings = run.diagnostics().messages();
        if matches!(error, ProvisionError::LaunchFailed { .. }) {
            let mut cleanup = Diagnostics::default();
            self.launcher()
                .teardown(id, &run.tenant().dir, &mut cleanup)
                .await;
            tracing::info!(tenant = %id, "partially launched stack removed");
            warnings.extend(cleanup.messages());
        }

        self.progress.fail(
            id,
            error.to_string(),
            json!({
                "error": error.to_string(),
                "kind": error.kind(),
                "warnings": warnings,
                "containers": snapshot,
            }),
        );
        error
    }

    /// Allocate and run in one call.
    pub async fn provision(
        &self,
        credentials: AdminCredentials,
    ) -> Result<StoreReport, ProvisionError> {
        let tenant = self.prepare(credentials).await?;
        self.run(tenant).await
    }

    /// Bring a tenant's stack down. The directory stays so identities remain unique.
    pub async fn teardown(&self, id: TenantId) -> Result<Vec<String>, ProvisionError> {
        let dir = self
            .tenants
            .existing(id)
            .await
            .ok_or_else(|| ProvisionError::UnknownTenant(id.to_string()))?;
        let _identity = self.claim_identity(id)?;

        let mut diagnostics = Diagnostics::default();
        self.launcher().teardown(id, &dir, &mut diagnostics).await;
        tracing::info!(tenant = %id, warnings = diagnostics.warnings().len(), "tenant torn down");
        Ok(diagnostics.messages())
    }
}
