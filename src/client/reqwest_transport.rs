//! reqwest-backed HTTP transport.
//!
//! This is the production [`HttpTransport`] implementation. It issues one
//! GET per call with no timeout or retry of its own; callers that need a
//! timeout configure it on the underlying [`reqwest::Client`].

use async_trait::async_trait;
use http::HeaderMap;
use reqwest::Client;

use crate::error::TransportError;

use super::transport::{HttpTransport, RawResponse};

/// [`HttpTransport`] implementation over a shared [`reqwest::Client`].
///
/// Cloning is cheap; the inner client is reference-counted and pools
/// connections across clones.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport over an existing client, e.g. one configured with
    /// a timeout or proxy by the application.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    TransportError::InvalidUrl(e.to_string())
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
