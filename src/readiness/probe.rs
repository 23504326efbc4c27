//! Liveness probes.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

/// Why a probe did not count as success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend answered {0}")]
    Status(u16),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// One liveness check against the backend.
pub trait Probe: Send + Sync {
    fn probe(&self) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// `GET <base_url><path>`; any 2xx is success.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(base_url: &str, path: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Probe for HttpProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(self.timeout)
                } else {
                    ProbeError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}
