//! HTTP client for the stateless echo endpoint.

use std::time::Duration;

use crate::envelope::{EchoAck, SyncEnvelope};
use crate::error::SyncError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts envelopes to a single endpoint URL as JSON.
pub struct EchoClient {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl EchoClient {
    pub fn new(endpoint: &str) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Push one envelope and return the endpoint's acknowledgement.
    ///
    /// Transport failures, non-2xx statuses and `success: false` bodies all
    /// surface as `SyncError`; the caller decides whether to care.
    pub async fn push(&self, envelope: &SyncEnvelope) -> Result<EchoAck, SyncError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SyncError::Status {
                status: resp.status().as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let ack: EchoAck = resp
            .json()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;
        if !ack.success {
            return Err(SyncError::Rejected(ack.message.clone()));
        }
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized() {
        let client = EchoClient::new("https://example.test/api/sync-vote/");
        assert_eq!(client.endpoint(), "https://example.test/api/sync-vote");
    }
}
