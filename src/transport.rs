//! Outbound HTTP transport
//!
//! Thin seam over `reqwest` so source clients stay testable without a
//! network. Adapters only need GET with custom headers and a bounded
//! timeout; anything richer belongs in the adapter itself.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::shared::errors::TransportError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Raw response handed back to the adapters
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body)
            .map_err(|e| TransportError::Network(format!("Invalid JSON body: {}", e)))
    }
}

/// Generic request/response transport used by every source client
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a shared `reqwest` client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(TransportError::from)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::from)?;

        Ok(TransportResponse { status, body })
    }
}
