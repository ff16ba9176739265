// ABOUTME: Post-install finalization: trigger the installer's admin rename and find the result.
// ABOUTME: Discovery runs ordered strategies inside the storefront container, with bounded retries.

use crate::config::FinalizeConfig;
use crate::probe::{HttpProbe, ProbeOptions};
use crate::progress::{ProgressTracker, Stage};
use crate::runtime::{ExecConfig, ExecOps};
use crate::tenant::Tenant;
use crate::types::ContainerId;
use async_trait::async_trait;
use std::time::Duration;

/// Admin folder reported for a tenant. Always carries a usable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPath {
    /// The renamed folder found inside the container.
    Discovered(String),
    /// Nothing renamed was found; the installer's default name.
    Default(String),
}

impl AdminPath {
    pub fn as_str(&self) -> &str {
        match self {
            AdminPath::Discovered(name) | AdminPath::Default(name) => name,
        }
    }

    pub fn is_discovered(&self) -> bool {
        matches!(self, AdminPath::Discovered(_))
    }
}

/// Result of one discovery strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Found(String),
    NotFound,
}

/// Where and what to look for inside the storefront container.
#[derive(Debug, Clone)]
pub struct DiscoveryTarget {
    pub container: ContainerId,
    pub document_root: String,
    pub prefix: String,
    pub default_name: String,
    pub exec_timeout: Duration,
}

impl DiscoveryTarget {
    /// Whether `name` is a renamed admin folder.
    fn accepts(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name != self.default_name
    }
}

#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn discover(&self, runtime: &dyn ExecOps, target: &DiscoveryTarget) -> Discovery;
}

/// Run `cmd` in the container and return stdout lines, or None on any failure.
async fn exec_lines(
    runtime: &dyn ExecOps,
    target: &DiscoveryTarget,
    cmd: Vec<String>,
) -> Option<Vec<String>> {
    let config = ExecConfig::capture(cmd, target.exec_timeout);
    match runtime.exec(&target.container, &config).await {
        Ok(result) if result.success() => Some(
            result
                .stdout_lossy()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Ok(result) => {
            tracing::debug!(
                container = %target.container,
                exit_code = result.exit_code,
                stderr = %String::from_utf8_lossy(&result.stderr),
                "discovery command failed"
            );
            None
        }
        Err(e) => {
            tracing::debug!(container = %target.container, error = %e, "discovery exec failed");
            None
        }
    }
}

/// Lists the document root; the first renamed directory in listing order wins.
pub struct ListingStrategy;

#[async_trait]
impl DiscoveryStrategy for ListingStrategy {
    fn name(&self) -> &'static str {
        "listing"
    }

    async fn discover(&self, runtime: &dyn ExecOps, target: &DiscoveryTarget) -> Discovery {
        // -p marks directories with a trailing slash.
        let cmd = vec![
            "ls".to_string(),
            "-1".to_string(),
            "-p".to_string(),
            target.document_root.clone(),
        ];
        let Some(lines) = exec_lines(runtime, target, cmd).await else {
            return Discovery::NotFound;
        };

        lines
            .iter()
            .filter_map(|l| l.strip_suffix('/'))
            .find(|name| target.accepts(name))
            .map(|name| Discovery::Found(name.to_string()))
            .unwrap_or(Discovery::NotFound)
    }
}

/// Pattern search with `find`, one level below the document root.
pub struct FindStrategy;

#[async_trait]
impl DiscoveryStrategy for FindStrategy {
    fn name(&self) -> &'static str {
        "find"
    }

    async fn discover(&self, runtime: &dyn ExecOps, target: &DiscoveryTarget) -> Discovery {
        let cmd = vec![
            "find".to_string(),
            target.document_root.clone(),
            "-mindepth".to_string(),
            "1".to_string(),
            "-maxdepth".to_string(),
            "1".to_string(),
            "-type".to_string(),
            "d".to_string(),
            "-name".to_string(),
            format!("{}*", target.prefix),
        ];
        let Some(lines) = exec_lines(runtime, target, cmd).await else {
            return Discovery::NotFound;
        };

        lines
            .iter()
            .map(|path| path.trim_end_matches('/'))
            .map(|path| path.rsplit('/').next().unwrap_or(path))
            .find(|name| target.accepts(name))
            .map(|name| Discovery::Found(name.to_string()))
            .unwrap_or(Discovery::NotFound)
    }
}

pub fn default_strategies() -> Vec<Box<dyn DiscoveryStrategy>> {
    vec![Box::new(ListingStrategy), Box::new(FindStrategy)]
}

/// Drives the trigger request and the discovery passes for one tenant.
pub struct Finalizer<'a, H: ?Sized> {
    runtime: &'a dyn ExecOps,
    probe: &'a H,
    progress: &'a ProgressTracker,
    config: FinalizeConfig,
    strategies: &'a [Box<dyn DiscoveryStrategy>],
}

impl<'a, H> Finalizer<'a, H>
where
    H: HttpProbe + ?Sized,
{
    pub fn new(
        runtime: &'a dyn ExecOps,
        probe: &'a H,
        progress: &'a ProgressTracker,
        config: FinalizeConfig,
        strategies: &'a [Box<dyn DiscoveryStrategy>],
    ) -> Self {
        Self {
            runtime,
            probe,
            progress,
            config,
            strategies,
        }
    }

    pub async fn finalize(&self, tenant: &Tenant, target: &DiscoveryTarget) -> AdminPath {
        let trigger_url = format!("{}/{}", tenant.local_url(), target.default_name);
        self.progress.update(
            tenant.id,
            Stage::Finalizing,
            "Triggering post-install configuration",
            86,
        );
        match self
            .probe
            .get(&trigger_url, ProbeOptions::following(self.config.trigger_timeout))
            .await
        {
            Ok(response) => {
                tracing::debug!(tenant = %tenant.id, status = response.status, "admin rename triggered")
            }
            Err(e) => tracing::debug!(tenant = %tenant.id, error = %e, "admin trigger request failed"),
        }

        tokio::time::sleep(self.config.settle_delay).await;

        let passes = self.config.retries.saturating_add(1);
        for pass in 0..passes {
            if pass > 0 {
                tracing::debug!(tenant = %tenant.id, pass, "admin folder not renamed yet, retrying");
                tokio::time::sleep(self.config.retry_delay).await;
            }

            self.progress.update(
                tenant.id,
                Stage::Finalizing,
                format!("Locating admin folder (pass {}/{})", pass + 1, passes),
                90 + (pass.min(1) * 5) as u8,
            );

            for strategy in self.strategies {
                if let Discovery::Found(name) = strategy.discover(self.runtime, target).await {
                    tracing::info!(
                        tenant = %tenant.id,
                        strategy = strategy.name(),
                        admin_folder = %name,
                        "admin folder discovered"
                    );
                    return AdminPath::Discovered(name);
                }
            }
        }

        AdminPath::Default(target.default_name.clone())
    }
}
