//! Backend availability probe.

use async_trait::async_trait;
use std::time::Duration;

/// Answers "is the preferred backend reachable right now?".
///
/// Implementations never fail: every error is reported as unavailable.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    async fn is_available(&self) -> bool;

    /// Endpoint checked, for logs.
    fn endpoint(&self) -> &str;
}

/// Single GET against a health endpoint; any 2xx within the timeout counts.
///
/// No retries.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BackendProbe for HttpHealthProbe {
    async fn is_available(&self) -> bool {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await;

        let available = match response {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    timed_out = e.is_timeout(),
                    error = %e,
                    "Health probe failed"
                );
                false
            }
        };

        tracing::info!(endpoint = %self.endpoint, available, "Probed inference backend");
        available
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Probe with a fixed answer.
///
/// Used when no backend is configured at all, and in tests.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    available: bool,
}

impl StaticProbe {
    pub fn available() -> Self {
        Self { available: true }
    }

    pub fn unavailable() -> Self {
        Self { available: false }
    }
}

#[async_trait]
impl BackendProbe for StaticProbe {
    async fn is_available(&self) -> bool {
        self.available
    }

    fn endpoint(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        // Port 9 (discard) is closed on test hosts.
        let probe = HttpHealthProbe::new("http://127.0.0.1:9/api/tags", Duration::from_millis(500));
        assert!(!probe.is_available().await);
    }

    #[tokio::test]
    async fn test_malformed_endpoint_is_unavailable() {
        let probe = HttpHealthProbe::new("not a url", Duration::from_millis(200));
        assert!(!probe.is_available().await);
    }

    #[tokio::test]
    async fn test_static_probe() {
        assert!(StaticProbe::available().is_available().await);
        assert!(!StaticProbe::unavailable().is_available().await);
    }
}
