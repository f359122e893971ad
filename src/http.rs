//! Shared HTTP client for network probes
//!
//! A thin wrapper over reqwest carrying the probe timeout and User-Agent.
//! Probes get exactly one attempt: a probe failure is a normal per-target
//! outcome, so there is no retry loop here beyond what the transport does
//! implicitly. Timeouts surface as network errors.

use crate::error::ProbeError;
use reqwest::Client;
use std::time::Duration;

/// Default User-Agent header
const USER_AGENT: &str = concat!("sysup/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper shared by the network probes
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ProbeError::network("", "http client", format!("failed to build client: {}", e))
            })?;
        Ok(Self { client })
    }

    /// Perform a GET request. Transport failures (including timeout) map
    /// to [`ProbeError::Network`]; HTTP status interpretation is left to
    /// the caller, which knows its endpoint's conventions.
    pub async fn get(
        &self,
        url: &str,
        subject: &str,
        source: &str,
    ) -> Result<reqwest::Response, ProbeError> {
        self.client.get(url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            ProbeError::network(subject, source, message)
        })
    }
}
