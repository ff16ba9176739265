// ABOUTME: State transition methods for tenant provisioning.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::config::Config;
use crate::diagnostics::Warning;
use crate::probe::{HttpProbe, ProbeOptions};
use crate::progress::{ProgressTracker, Stage};
use crate::runtime::{ContainerOps, ExecOps, StackOps};
use crate::stack::StackRenderer;

use super::error::{Dependency, ProvisionError};
use super::finalize::{DiscoveryStrategy, DiscoveryTarget, Finalizer};
use super::launch::StackLauncher;
use super::provisioning::Provisioning;
use super::readiness::{
    ContainerHealth, FirstHealthy, HttpOk, Outcome, PercentBand, PollPlan, ReadinessMonitor,
};
use super::report::StoreReport;
use super::state::{
    Allocated, ApplicationPending, ApplicationReady, DatabaseReady, Finalized, Launched,
};

/// Result type for transitions; on failure the run comes back for diagnostics.
pub type TransitionResult<T, S> = Result<Provisioning<T>, (Provisioning<S>, ProvisionError)>;

/// Collaborators shared by every transition of a run.
pub struct Pipeline<'a, R, H: ?Sized> {
    pub runtime: &'a R,
    pub probe: &'a H,
    pub renderer: &'a dyn StackRenderer,
    pub progress: &'a ProgressTracker,
    pub config: &'a Config,
    pub strategies: &'a [Box<dyn DiscoveryStrategy>],
}

impl<S> Provisioning<S> {
    fn transition<T>(self, state: T) -> Provisioning<T> {
        Provisioning {
            tenant: self.tenant,
            diagnostics: self.diagnostics,
            state,
        }
    }
}

// =============================================================================
// Allocated -> Launched
// =============================================================================

impl Provisioning<Allocated> {
    /// Tear down any stale stack, write the definition and bring it up.
    #[must_use = "provisioning state must be used"]
    pub async fn launch<R, H>(mut self, ctx: &Pipeline<'_, R, H>) -> TransitionResult<Launched, Allocated>
    where
        R: ContainerOps + StackOps,
        H: ?Sized,
    {
        let id = self.tenant.id;
        ctx.progress
            .update(id, Stage::Launching, "Starting database and storefront containers", 15);
        tracing::info!(tenant = %id, port = self.tenant.port, "launching stack");

        let launcher = StackLauncher::new(ctx.runtime, ctx.renderer, ctx.config.launch);
        match launcher.launch(&self.tenant, &mut self.diagnostics).await {
            Ok(result) => {
                ctx.progress
                    .update(id, Stage::Launching, "Containers started", PercentBand::DATABASE.start);
                Ok(self.transition(Launched {
                    stack: result.stack,
                }))
            }
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// Launched -> DatabaseReady
// =============================================================================

impl Provisioning<Launched> {
    /// Poll the database container's health. Timing out is fatal.
    #[must_use = "provisioning state must be used"]
    pub async fn await_database<R, H>(
        self,
        ctx: &Pipeline<'_, R, H>,
    ) -> TransitionResult<DatabaseReady, Launched>
    where
        R: ContainerOps,
        H: ?Sized,
    {
        let id = self.tenant.id;
        let predicate = ContainerHealth::new(ctx.runtime, id.database_container());
        let monitor = ReadinessMonitor::new(ctx.progress, id, Stage::WaitingForDatabase, "database");
        let plan = PollPlan {
            max_attempts: ctx.config.database.max_attempts,
            interval: ctx.config.database.interval,
            band: PercentBand::DATABASE,
        };

        match monitor.await_healthy(&predicate, plan).await {
            Outcome::Healthy { .. } => Ok(self.transition(DatabaseReady)),
            Outcome::TimedOut { attempts } => Err((
                self,
                ProvisionError::DependencyTimedOut {
                    dependency: Dependency::Database,
                    attempts,
                },
            )),
        }
    }
}

// =============================================================================
// DatabaseReady -> ApplicationReady | ApplicationPending
// =============================================================================

/// The storefront either answered or is still starting; neither is fatal.
#[derive(Debug)]
pub enum ApplicationOutcome {
    Ready(Provisioning<ApplicationReady>),
    Pending(Provisioning<ApplicationPending>),
}

impl Provisioning<DatabaseReady> {
    /// Poll the storefront: container health first, direct HTTP probe as fallback.
    pub async fn await_application<R, H>(mut self, ctx: &Pipeline<'_, R, H>) -> ApplicationOutcome
    where
        R: ContainerOps,
        H: HttpProbe + ?Sized,
    {
        let id = self.tenant.id;
        let app = &ctx.config.application;
        let predicate = FirstHealthy::new(
            ContainerHealth::new(ctx.runtime, id.application_container()),
            HttpOk::new(
                ctx.probe,
                self.tenant.local_url(),
                ProbeOptions::following(app.probe_timeout),
            ),
        );
        let monitor =
            ReadinessMonitor::new(ctx.progress, id, Stage::WaitingForApplication, "storefront");
        let plan = PollPlan {
            max_attempts: app.max_attempts,
            interval: app.interval,
            band: PercentBand::APPLICATION,
        };

        match monitor.await_healthy(&predicate, plan).await {
            Outcome::Healthy { .. } => ApplicationOutcome::Ready(self.transition(ApplicationReady)),
            Outcome::TimedOut { attempts } => {
                self.diagnostics.warn(Warning::application_slow(format!(
                    "{id}: storefront not answering after {attempts} attempts, reporting pending"
                )));
                ApplicationOutcome::Pending(self.transition(ApplicationPending { attempts }))
            }
        }
    }
}

// =============================================================================
// ApplicationReady -> Finalized
// =============================================================================

impl Provisioning<ApplicationReady> {
    /// Trigger the admin rename and discover the folder. Never fails.
    pub async fn finalize<R, H>(mut self, ctx: &Pipeline<'_, R, H>) -> Provisioning<Finalized>
    where
        R: ExecOps,
        H: HttpProbe + ?Sized,
    {
        let stack = &ctx.config.stack;
        let target = DiscoveryTarget {
            container: self.tenant.id.application_container(),
            document_root: stack.document_root.clone(),
            prefix: stack.admin_prefix.clone(),
            default_name: stack.admin_folder.clone(),
            exec_timeout: ctx.config.finalize.exec_timeout,
        };

        let finalizer = Finalizer::new(
            ctx.runtime,
            ctx.probe,
            ctx.progress,
            ctx.config.finalize,
            ctx.strategies,
        );
        let admin = finalizer.finalize(&self.tenant, &target).await;

        if !admin.is_discovered() {
            self.diagnostics.warn(Warning::admin_path_default(format!(
                "{}: admin folder not renamed, reporting default '{}'",
                self.tenant.id,
                admin.as_str()
            )));
        }

        self.tenant.admin_folder = admin.as_str().to_string();
        self.transition(Finalized { admin })
    }
}

// =============================================================================
// Terminal states -> StoreReport
// =============================================================================

impl Provisioning<Finalized> {
    pub fn into_report(self, public_host: &str) -> StoreReport {
        StoreReport::completed(
            &self.tenant,
            &self.state.admin,
            public_host,
            self.diagnostics.messages(),
        )
    }
}

impl Provisioning<ApplicationPending> {
    pub fn into_report(self, public_host: &str) -> StoreReport {
        StoreReport::pending(
            &self.tenant,
            self.state.attempts,
            public_host,
            self.diagnostics.messages(),
        )
    }
}
