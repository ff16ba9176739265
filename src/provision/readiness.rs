// ABOUTME: Bounded readiness polling for the database and storefront containers.
// ABOUTME: A Polling/Healthy/TimedOut state machine driven by a pluggable health predicate.

use crate::probe::{HttpProbe, ProbeOptions};
use crate::progress::{ProgressTracker, Stage};
use crate::runtime::{ContainerOps, ContainerState, HealthState};
use crate::types::{ContainerId, TenantId};
use async_trait::async_trait;
use std::time::Duration;

/// Result of evaluating a health predicate once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Healthy,
    /// Reachable but not ready yet.
    NotYet(String),
    /// No usable signal, e.g. the container defines no health check.
    Inconclusive(String),
}

impl Check {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Check::Healthy)
    }

    fn detail(&self) -> &str {
        match self {
            Check::Healthy => "healthy",
            Check::NotYet(d) | Check::Inconclusive(d) => d,
        }
    }
}

#[async_trait]
pub trait HealthPredicate: Send + Sync {
    async fn check(&self) -> Check;
}

/// Healthy when the runtime reports the container's health check as healthy.
pub struct ContainerHealth<'a, R: ?Sized> {
    runtime: &'a R,
    container: ContainerId,
}

impl<'a, R: ?Sized> ContainerHealth<'a, R> {
    pub fn new(runtime: &'a R, container: ContainerId) -> Self {
        Self { runtime, container }
    }
}

#[async_trait]
impl<R> HealthPredicate for ContainerHealth<'_, R>
where
    R: ContainerOps + ?Sized,
{
    async fn check(&self) -> Check {
        let info = match self.runtime.inspect_container(&self.container).await {
            Ok(info) => info,
            Err(e) if e.is_absent() => return Check::NotYet(format!("{}: not created yet", self.container)),
            Err(e) => return Check::Inconclusive(format!("inspect failed: {e}")),
        };

        if info.state != ContainerState::Running {
            return Check::NotYet(format!("{}: {:?}", self.container, info.state).to_lowercase());
        }

        match info.health {
            Some(HealthState::Healthy) => Check::Healthy,
            Some(HealthState::Starting) => Check::NotYet(format!("{}: starting", self.container)),
            Some(HealthState::Unhealthy) => Check::NotYet(format!("{}: unhealthy", self.container)),
            Some(HealthState::None) | None => {
                Check::Inconclusive(format!("{}: no health status", self.container))
            }
        }
    }
}

/// Healthy when a GET of `url` answers 200.
pub struct HttpOk<'a, H: ?Sized> {
    probe: &'a H,
    url: String,
    options: ProbeOptions,
}

impl<'a, H: ?Sized> HttpOk<'a, H> {
    pub fn new(probe: &'a H, url: impl Into<String>, options: ProbeOptions) -> Self {
        Self {
            probe,
            url: url.into(),
            options,
        }
    }
}

#[async_trait]
impl<H> HealthPredicate for HttpOk<'_, H>
where
    H: HttpProbe + ?Sized,
{
    async fn check(&self) -> Check {
        match self.probe.get(&self.url, self.options).await {
            Ok(response) if response.is_ok() => Check::Healthy,
            Ok(response) => Check::NotYet(format!("HTTP {}", response.status)),
            Err(e) => Check::NotYet(e.to_string()),
        }
    }
}

/// Healthy when either predicate is. The fallback is only consulted when the
/// primary is not healthy.
pub struct FirstHealthy<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> FirstHealthy<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<A, B> HealthPredicate for FirstHealthy<A, B>
where
    A: HealthPredicate,
    B: HealthPredicate,
{
    async fn check(&self) -> Check {
        let primary = self.primary.check().await;
        if primary.is_healthy() {
            return primary;
        }

        match self.fallback.check().await {
            Check::Healthy => Check::Healthy,
            fallback => Check::NotYet(format!("{}; {}", primary.detail(), fallback.detail())),
        }
    }
}

/// Slice of the overall percent scale owned by one polling phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentBand {
    pub start: u8,
    pub end: u8,
}

impl PercentBand {
    pub const DATABASE: PercentBand = PercentBand { start: 20, end: 40 };
    pub const APPLICATION: PercentBand = PercentBand { start: 40, end: 85 };

    /// Percent after `attempt` of `max_attempts`, never past `end`.
    pub fn at(&self, attempt: u32, max_attempts: u32) -> u8 {
        let span = u32::from(self.end.saturating_sub(self.start));
        let max = max_attempts.max(1);
        let offset = span * attempt.min(max) / max;
        self.start.saturating_add(offset as u8).min(self.end)
    }
}

/// Polling state. `Healthy` and `TimedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling { attempt: u32 },
    Healthy { attempts: u32 },
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn start() -> Self {
        PollState::Polling { attempt: 1 }
    }

    /// Next state after evaluating the predicate during `Polling`.
    pub fn next(self, check: &Check, max_attempts: u32) -> Self {
        match self {
            PollState::Polling { attempt } if check.is_healthy() => {
                PollState::Healthy { attempts: attempt }
            }
            PollState::Polling { attempt } if attempt >= max_attempts => {
                PollState::TimedOut { attempts: attempt }
            }
            PollState::Polling { attempt } => PollState::Polling {
                attempt: attempt + 1,
            },
            terminal => terminal,
        }
    }
}

/// Terminal outcome of a polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Healthy { attempts: u32 },
    TimedOut { attempts: u32 },
}

/// Attempt budget, pacing and progress band for one dependency.
#[derive(Debug, Clone, Copy)]
pub struct PollPlan {
    pub max_attempts: u32,
    pub interval: Duration,
    pub band: PercentBand,
}

/// Polls one dependency of one tenant, reporting each attempt as progress.
pub struct ReadinessMonitor<'a> {
    progress: &'a ProgressTracker,
    tenant: TenantId,
    stage: Stage,
    label: &'a str,
}

impl<'a> ReadinessMonitor<'a> {
    pub fn new(progress: &'a ProgressTracker, tenant: TenantId, stage: Stage, label: &'a str) -> Self {
        Self {
            progress,
            tenant,
            stage,
            label,
        }
    }

    pub async fn await_healthy<P>(&self, predicate: &P, plan: PollPlan) -> Outcome
    where
        P: HealthPredicate + ?Sized,
    {
        let max = plan.max_attempts.max(1);
        let mut state = PollState::start();

        loop {
            match state {
                PollState::Polling { attempt } => {
                    let check = predicate.check().await;
                    let percent = plan.band.at(attempt, max);
                    tracing::debug!(
                        tenant = %self.tenant,
                        dependency = self.label,
                        attempt,
                        max,
                        detail = check.detail(),
                        "readiness check"
                    );
                    self.progress.update(
                        self.tenant,
                        self.stage,
                        format!(
                            "Waiting for {} ({}/{}): {}",
                            self.label,
                            attempt,
                            max,
                            check.detail()
                        ),
                        percent,
                    );

                    state = state.next(&check, max);
                    if matches!(state, PollState::Polling { .. }) {
                        tokio::time::sleep(plan.interval).await;
                    }
                }
                PollState::Healthy { attempts } => {
                    tracing::info!(tenant = %self.tenant, dependency = self.label, attempts, "healthy");
                    return Outcome::Healthy { attempts };
                }
                PollState::TimedOut { attempts } => {
                    tracing::warn!(tenant = %self.tenant, dependency = self.label, attempts, "gave up waiting");
                    return Outcome::TimedOut { attempts };
                }
            }
        }
    }
}
