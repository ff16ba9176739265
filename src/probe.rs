// ABOUTME: HTTP probe seam used by readiness polling and the post-install trigger.
// ABOUTME: ReqwestProbe is the production implementation; tests substitute fakes.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Redirect hops followed when a probe asks for redirects.
const MAX_REDIRECTS: usize = 10;

/// Per-request options.
#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl ProbeOptions {
    /// Plain probe without redirect following; a 302 is reported as such.
    pub fn strict(timeout: Duration) -> Self {
        Self {
            timeout,
            follow_redirects: false,
        }
    }

    /// Probe that lands wherever the redirect chain ends.
    pub fn following(timeout: Duration) -> Self {
        Self {
            timeout,
            follow_redirects: true,
        }
    }
}

/// Status of a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
}

impl ProbeResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Issues GET requests with an explicit timeout.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn get(&self, url: &str, options: ProbeOptions) -> Result<ProbeResponse, ProbeError>;
}

/// Probe backed by two reqwest clients, one per redirect policy.
#[derive(Clone)]
pub struct ReqwestProbe {
    strict: Client,
    following: Client,
}

impl ReqwestProbe {
    pub fn new() -> Result<Self, ProbeError> {
        let strict = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| ProbeError::Request(format!("failed to create HTTP client: {e}")))?;
        let following = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ProbeError::Request(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { strict, following })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get(&self, url: &str, options: ProbeOptions) -> Result<ProbeResponse, ProbeError> {
        let client = if options.follow_redirects {
            &self.following
        } else {
            &self.strict
        };

        let response = client
            .get(url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::TimedOut(options.timeout)
                } else if e.is_connect() {
                    ProbeError::Connect(e.to_string())
                } else {
                    ProbeError::Request(e.to_string())
                }
            })?;

        Ok(ProbeResponse {
            status: response.status().as_u16(),
        })
    }
}
