//! Client configuration.
//!
//! A [`RetrievalConfig`] carries everything that is fixed at client
//! construction time: the WADO-RS base URL and the default header set sent
//! with every request. There is no per-call header override; all header
//! policy comes from the configuration (matching the upstream client this
//! crate is modeled on).
//!
//! # Example
//!
//! ```
//! use wado_frame_client::RetrievalConfig;
//!
//! let config = RetrievalConfig::new("https://dicom.us-east-1.amazonaws.com/datastore/abc");
//! assert!(config.validate().is_ok());
//! ```

use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::ConfigError;

// =============================================================================
// Default Values
// =============================================================================

/// Accept header sent with frame requests.
///
/// AWS HealthImaging returns octet-stream-typed parts rather than the
/// DICOM-conformant `application/dicom`, so the non-standard type parameter
/// is required for the server to answer at all.
pub const DEFAULT_FRAME_ACCEPT: &str = "multipart/related; type=application/octet-stream";

/// Accept header sent with bulkdata requests.
pub const DEFAULT_BULKDATA_ACCEPT: &str = "application/octet-stream";

// =============================================================================
// Retrieval Configuration
// =============================================================================

/// Configuration for a WADO-RS retrieval client.
///
/// Immutable once handed to a client; the client holds it for its lifetime
/// and shares no other state across calls.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// WADO-RS root, e.g. `https://host/datastore/{id}` or a proxy path root.
    pub base_url: String,

    /// Headers merged into every request. Entries here overlay the built-in
    /// `Accept` default, so a configured `Accept` wins.
    pub headers: HeaderMap,
}

impl RetrievalConfig {
    /// Create a configuration with the given base URL and no extra headers.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Replace the default header set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add a single default header (e.g. an Authorization token).
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Validate the configuration.
    ///
    /// The base URL must be a non-empty absolute `http` or `https` URL.
    /// Note that the URI builders themselves never validate; this check is
    /// for callers that want to fail fast at construction time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
