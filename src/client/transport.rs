use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use crate::error::TransportError;

/// A raw HTTP response as seen by the retrieval client.
///
/// Transient: produced by the transport, classified immediately, never
/// persisted.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Full response body
    pub body: Bytes,
}

impl RawResponse {
    /// Whether the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `content-type` header value, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Trait for issuing HTTP GET requests against a WADO-RS endpoint.
///
/// This abstraction keeps the retrieval client testable without a live
/// server and leaves timeouts, cancellation, connection pooling, and retry
/// policy to the implementation or its caller. Implementations must be
/// thread-safe: one client instance is shared across concurrent retrievals.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a single GET with the given headers and return the full
    /// response, including non-2xx responses. Errors are reserved for
    /// failures that produced no response at all.
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError>;
}
