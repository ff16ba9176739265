// ABOUTME: Timeouts, polling budgets and delays for each provisioning phase.
// ABOUTME: All durations are humantime strings in YAML ("2s", "5m").

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Bound on `compose up -d`.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Bound on `compose down` and each container stop during teardown.
    #[serde(with = "humantime_serde")]
    pub teardown_timeout: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        LaunchConfig {
            timeout: Duration::from_secs(120),
            teardown_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DatabasePolling {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for DatabasePolling {
    fn default() -> Self {
        DatabasePolling {
            max_attempts: 30,
            interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ApplicationPolling {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Timeout for each direct HTTP probe of the storefront.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for ApplicationPolling {
    fn default() -> Self {
        ApplicationPolling {
            max_attempts: 60,
            interval: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FinalizeConfig {
    /// Timeout of the GET that triggers the installer's admin rename.
    #[serde(with = "humantime_serde")]
    pub trigger_timeout: Duration,

    /// Wait between the trigger and the first discovery pass.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,

    /// Wait before each additional discovery pass.
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Additional discovery passes after the first.
    pub retries: u32,

    /// Bound on each command run inside the storefront container.
    #[serde(with = "humantime_serde")]
    pub exec_timeout: Duration,
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        FinalizeConfig {
            trigger_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(10),
            retry_delay: Duration::from_secs(20),
            retries: 1,
            exec_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Records older than this are dropped regardless of status.
    #[serde(with = "humantime_serde")]
    pub retention: Duration,

    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
        }
    }
}
