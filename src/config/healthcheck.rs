// ABOUTME: Container health check configuration for rendered stacks.
// ABOUTME: Command, interval, timeout, retries and optional start grace period.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcheckConfig {
    /// Command in compose `test` form, e.g. `["CMD-SHELL", "curl -f http://localhost"]`.
    pub test: Vec<String>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_period: Option<Duration>,
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

impl HealthcheckConfig {
    /// MySQL answers `mysqladmin ping` once it accepts connections.
    pub fn database_default() -> Self {
        HealthcheckConfig {
            test: vec![
                "CMD".to_string(),
                "mysqladmin".to_string(),
                "ping".to_string(),
                "-h".to_string(),
                "localhost".to_string(),
            ],
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            retries: 10,
            start_period: Some(Duration::from_secs(20)),
        }
    }

    /// The storefront serves its front page over plain HTTP on port 80.
    pub fn application_default() -> Self {
        HealthcheckConfig {
            test: vec![
                "CMD-SHELL".to_string(),
                "curl -fs -o /dev/null http://localhost/ || exit 1".to_string(),
            ],
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
            retries: 12,
            start_period: Some(Duration::from_secs(60)),
        }
    }
}
