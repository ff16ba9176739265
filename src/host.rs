// ABOUTME: Resolves the host name placed in store URLs.
// ABOUTME: Explicit config wins; otherwise the EC2 instance metadata service is asked.

use crate::config::Config;
use reqwest::Client;
use std::time::Duration;

/// Address used when nothing better is known.
pub const FALLBACK_HOST: &str = "127.0.0.1";

/// Instance metadata endpoint on EC2.
pub const METADATA_ENDPOINT: &str = "http://169.254.169.254";

const METADATA_TIMEOUT: Duration = Duration::from_secs(2);
const TOKEN_TTL_SECONDS: &str = "21600";

/// Reads the instance's addresses from the metadata service (IMDSv2, with
/// IMDSv1 fallback when no token is issued).
pub struct MetadataClient {
    client: Client,
    endpoint: String,
}

impl MetadataClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    async fn token(&self) -> Option<String> {
        let response = self
            .client
            .put(format!("{}/latest/api/token", self.endpoint))
            .header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECONDS)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| tracing::debug!(error = %e, "metadata token request failed"))
            .ok()?;

        if !response.status().is_success() {
            return None;
        }
        let token = response.text().await.ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    async fn field(&self, token: Option<&str>, name: &str) -> Option<String> {
        let mut request = self
            .client
            .get(format!("{}/latest/meta-data/{}", self.endpoint, name))
            .timeout(METADATA_TIMEOUT);
        if let Some(token) = token {
            request = request.header("X-aws-ec2-metadata-token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| tracing::debug!(field = name, error = %e, "metadata request failed"))
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let value = response.text().await.ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Public IPv4, else private IPv4, else None.
    pub async fn detect(&self) -> Option<String> {
        let token = self.token().await;
        if token.is_none() {
            tracing::debug!("no metadata token issued, trying IMDSv1");
        }

        for field in ["public-ipv4", "local-ipv4"] {
            if let Some(ip) = self.field(token.as_deref(), field).await {
                tracing::info!(field, ip = %ip, "public host detected from instance metadata");
                return Some(ip);
            }
        }
        None
    }
}

/// Host for store URLs: `public_host` (or `SERVER_IP`), then metadata
/// detection when enabled, then [`FALLBACK_HOST`].
pub async fn resolve_public_host(config: &Config) -> String {
    resolve_with(config, &MetadataClient::new(METADATA_ENDPOINT)).await
}

pub async fn resolve_with(config: &Config, metadata: &MetadataClient) -> String {
    if let Some(host) = config.public_host.as_deref().filter(|h| !h.trim().is_empty()) {
        return host.trim().to_string();
    }

    if config.detect_public_host {
        if let Some(ip) = metadata.detect().await {
            return ip;
        }
        tracing::warn!("instance metadata unavailable, using {FALLBACK_HOST}");
    }

    FALLBACK_HOST.to_string()
}
