//! Shared HTTP plumbing for catalog providers.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ProviderError, ProviderResult};

/// Thin wrapper over a shared `reqwest::Client` for JSON GET requests.
///
/// Cloning is cheap; all providers built from one `CatalogClient` share a
/// connection pool.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
}

impl CatalogClient {
    /// Build a client with a request timeout and User-Agent.
    ///
    /// # Errors
    /// Returns `ProviderError::Other` if the TLS backend cannot be initialized
    pub fn new(timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        Ok(Self { client })
    }

    /// Issue a GET with query parameters and decode the JSON body.
    ///
    /// # Errors
    /// - `NetworkError` if the request cannot be sent or the body read
    /// - `Timeout` if the client timeout elapses
    /// - `StatusError` for a non-2xx status
    /// - `ParseError` if the body does not decode into `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::StatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        debug!(url, bytes = body.len(), "catalog response received");

        Ok(serde_json::from_str(&body)?)
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}
