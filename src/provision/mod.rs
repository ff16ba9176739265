// ABOUTME: Tenant provisioning pipeline using the type state pattern.
// ABOUTME: Port allocation, stack launch, readiness polling and post-install finalization.

mod claim;
mod error;
mod finalize;
mod launch;
mod ports;
mod provisioner;
mod provisioning;
mod readiness;
mod report;
mod state;
mod transitions;

pub use claim::{Reservation, Reservations};
pub use error::{Dependency, ProvisionError, ProvisionErrorKind};
pub use finalize::{
    AdminPath, Discovery, DiscoveryStrategy, DiscoveryTarget, Finalizer, FindStrategy,
    ListingStrategy, default_strategies,
};
pub use launch::{LaunchResult, StackLauncher};
pub use ports::{BindProbe, PortAllocator, bind_all_interfaces, default_bind_probe};
pub use provisioner::{PreparedRun, Provisioner};
pub use provisioning::Provisioning;
pub use readiness::{
    Check, ContainerHealth, FirstHealthy, HealthPredicate, HttpOk, Outcome, PercentBand,
    PollPlan, PollState, ReadinessMonitor,
};
pub use report::{ReportStatus, StoreReport};
pub use state::{
    Allocated, ApplicationPending, ApplicationReady, DatabaseReady, Finalized, Launched,
};
pub use transitions::{ApplicationOutcome, Pipeline, TransitionResult};
