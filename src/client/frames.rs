//! Frame retrieval orchestration.
//!
//! [`FrameClient`] is the main entry point for frame requests. For each call
//! it:
//! 1. Resolves the requested frame number (rejecting invalid ones before any
//!    network I/O)
//! 2. Composes request headers from the AWS Accept default plus the
//!    configured overlay
//! 3. Builds the WADO-RS frame URL
//! 4. Issues a single GET through the [`HttpTransport`] seam
//! 5. Classifies the response by content type and either repairs a
//!    multipart body into per-frame buffers or passes the body through as a
//!    single frame
//!
//! The client holds nothing but its immutable configuration and transport,
//! so one instance is safe to share across concurrent retrievals. It does
//! no caching, retrying, or request coalescing; those belong to the caller
//! or the transport.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT};
use http::HeaderMap;
use tracing::debug;

use crate::config::{RetrievalConfig, DEFAULT_BULKDATA_ACCEPT, DEFAULT_FRAME_ACCEPT};
use crate::error::RetrieveError;
use crate::multipart::{boundary_from_content_type, repair};
use crate::uri::{frame_resource_uri, instance_resource_uri, InstanceReference};

use super::transport::{HttpTransport, RawResponse};

// =============================================================================
// Frame Selection
// =============================================================================

/// Ordered per-frame payload buffers, the sole output of frame retrieval.
/// Owned by the caller once returned.
pub type FramePayload = Vec<Bytes>;

/// The frame (or frames) a caller asked for.
///
/// Retrieval is single-frame: when a sequence is supplied only its first
/// element is honored, matching the upstream client this crate reproduces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSelector {
    /// A single 1-based frame index
    Index(u32),

    /// An ordered sequence of frame indices; only the first is retrieved
    Indices(Vec<u32>),

    /// Unparsed text, e.g. lifted straight out of a `wadors:` image id
    Raw(String),
}

impl FrameSelector {
    /// Resolve to a single positive frame number.
    ///
    /// This is the precondition gate: any failure here means no network call
    /// is made.
    pub fn resolve(&self) -> Result<u32, RetrieveError> {
        match self {
            FrameSelector::Index(n) => {
                if *n == 0 {
                    Err(RetrieveError::InvalidFrameNumber {
                        value: "0".to_string(),
                    })
                } else {
                    Ok(*n)
                }
            }

            // First-element rule: all but the first requested frame are
            // discarded.
            FrameSelector::Indices(frames) => match frames.first().copied() {
                Some(0) => Err(RetrieveError::InvalidFrameNumber {
                    value: "0".to_string(),
                }),
                Some(n) => Ok(n),
                None => Err(RetrieveError::InvalidFrameNumber {
                    value: "[]".to_string(),
                }),
            },

            FrameSelector::Raw(text) => match text.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(RetrieveError::InvalidFrameNumber {
                    value: text.clone(),
                }),
                Ok(n) => Ok(n),
            },
        }
    }
}

impl From<u32> for FrameSelector {
    fn from(n: u32) -> Self {
        FrameSelector::Index(n)
    }
}

impl From<Vec<u32>> for FrameSelector {
    fn from(frames: Vec<u32>) -> Self {
        FrameSelector::Indices(frames)
    }
}

impl From<&str> for FrameSelector {
    fn from(text: &str) -> Self {
        FrameSelector::Raw(text.to_string())
    }
}

impl From<String> for FrameSelector {
    fn from(text: String) -> Self {
        FrameSelector::Raw(text)
    }
}

/// A request for one frame of one instance.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// The instance the frame belongs to
    pub instance: InstanceReference,

    /// Which frame to retrieve
    pub frame: FrameSelector,
}

impl FrameRequest {
    /// Create a frame request.
    pub fn new(instance: InstanceReference, frame: impl Into<FrameSelector>) -> Self {
        Self {
            instance,
            frame: frame.into(),
        }
    }
}

// =============================================================================
// Frame Retrieval Capability
// =============================================================================

/// Capability trait for frame retrieval.
///
/// Callers (e.g. an image-loading layer) depend on this trait rather than on
/// [`FrameClient`] directly, so site-specific behavior stays swappable and
/// independently testable.
#[async_trait]
pub trait FrameRetrieval: Send + Sync {
    /// Retrieve one frame, returning its payload buffers in part order.
    async fn retrieve_frame(&self, request: FrameRequest) -> Result<FramePayload, RetrieveError>;
}

// =============================================================================
// Frame Client
// =============================================================================

/// WADO-RS frame retrieval client for AWS HealthImaging.
///
/// # Example
///
/// ```ignore
/// use wado_frame_client::{FrameClient, FrameRequest, InstanceReference, RetrievalConfig};
/// use wado_frame_client::ReqwestTransport;
///
/// let config = RetrievalConfig::new("https://dicom.us-east-1.amazonaws.com/datastore/abc");
/// let client = FrameClient::new(config, ReqwestTransport::new());
///
/// let instance = InstanceReference::new("1.2.3", "4.5.6", "7.8.9");
/// let frames = client.retrieve_frame(FrameRequest::new(instance, 1)).await?;
/// ```
pub struct FrameClient<T: HttpTransport> {
    /// Immutable configuration: base URL and default headers
    config: RetrievalConfig,

    /// HTTP transport seam
    transport: T,
}

impl<T: HttpTransport> FrameClient<T> {
    /// Create a client from a configuration and transport.
    pub fn new(config: RetrievalConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Compose request headers: the given Accept default first, then the
    /// configured headers overlaid on top. There is no per-call override;
    /// all header policy is fixed at construction.
    fn compose_headers(&self, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        for (name, value) in &self.config.headers {
            headers.insert(name.clone(), value.clone());
        }

        headers
    }

    /// Classify a successful response by content type and produce the
    /// payload sequence.
    ///
    /// The multipart check is a case-insensitive substring match, not a
    /// strict media-type parse. Strict parsing would reject the very server
    /// this client targets.
    fn classify(&self, response: RawResponse) -> Result<FramePayload, RetrieveError> {
        let content_type = response.content_type().map(str::to_string);

        let is_multipart = content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("multipart/related"))
            .unwrap_or(false);

        if is_multipart {
            let boundary = content_type.as_deref().and_then(boundary_from_content_type);
            let parts = repair(&response.body, boundary.as_deref())?;
            debug!(parts = parts.len(), "repaired multipart response");
            return Ok(parts);
        }

        // Anything else is a single raw frame.
        Ok(vec![response.body])
    }

    /// Issue one GET and fail on transport errors or non-2xx status.
    async fn get_checked(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<RawResponse, RetrieveError> {
        let response = self.transport.get(url, headers).await?;

        if !response.is_success() {
            return Err(RetrieveError::Failed {
                status: response.status,
            });
        }

        Ok(response)
    }

    /// Retrieve a whole instance as its constituent parts.
    ///
    /// Uses the same Accept default and classification pipeline as frame
    /// retrieval; a multipart instance response yields one buffer per part.
    pub async fn retrieve_instance(
        &self,
        instance: &InstanceReference,
    ) -> Result<FramePayload, RetrieveError> {
        let url = instance_resource_uri(instance, &self.config);
        let headers = self.compose_headers(DEFAULT_FRAME_ACCEPT);

        debug!(%url, "retrieving instance");
        let response = self.get_checked(&url, &headers).await?;
        self.classify(response)
    }

    /// Retrieve a bulkdata resource referenced from instance metadata.
    ///
    /// `bulkdata_path` is the path tail starting at `bulkdata/`, as found in
    /// a BulkDataURI. The body is returned verbatim.
    pub async fn retrieve_bulkdata(
        &self,
        instance: &InstanceReference,
        bulkdata_path: &str,
    ) -> Result<Bytes, RetrieveError> {
        let url = format!(
            "{}/{}",
            instance_resource_uri(instance, &self.config),
            bulkdata_path.trim_start_matches('/')
        );
        let headers = self.compose_headers(DEFAULT_BULKDATA_ACCEPT);

        debug!(%url, "retrieving bulkdata");
        let response = self.get_checked(&url, &headers).await?;
        Ok(response.body)
    }
}

#[async_trait]
impl<T: HttpTransport> FrameRetrieval for FrameClient<T> {
    async fn retrieve_frame(&self, request: FrameRequest) -> Result<FramePayload, RetrieveError> {
        // Precondition gate: resolve before any I/O.
        let frame = request.frame.resolve()?;

        let url = frame_resource_uri(&request.instance, &self.config, Some(frame));
        let headers = self.compose_headers(DEFAULT_FRAME_ACCEPT);

        debug!(%url, frame, "retrieving frame");
        let response = self.get_checked(&url, &headers).await?;
        self.classify(response)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // FrameSelector tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolve_index() {
        assert_eq!(FrameSelector::Index(7).resolve().unwrap(), 7);
    }

    #[test]
    fn test_resolve_index_zero_rejected() {
        assert!(matches!(
            FrameSelector::Index(0).resolve(),
            Err(RetrieveError::InvalidFrameNumber { .. })
        ));
    }

    #[test]
    fn test_resolve_sequence_takes_first() {
        let selector = FrameSelector::Indices(vec![3, 4, 5]);
        assert_eq!(selector.resolve().unwrap(), 3);
    }

    #[test]
    fn test_resolve_empty_sequence_rejected() {
        assert!(matches!(
            FrameSelector::Indices(vec![]).resolve(),
            Err(RetrieveError::InvalidFrameNumber { .. })
        ));
    }

    #[test]
    fn test_resolve_raw_text() {
        assert_eq!(FrameSelector::from("12").resolve().unwrap(), 12);
        assert_eq!(FrameSelector::from(" 12 ").resolve().unwrap(), 12);
    }

    #[test]
    fn test_resolve_raw_garbage_rejected() {
        for bad in ["abc", "NaN", "", "-1", "1.5"] {
            let err = FrameSelector::from(bad).resolve().unwrap_err();
            assert!(
                matches!(err, RetrieveError::InvalidFrameNumber { .. }),
                "expected InvalidFrameNumber for {:?}",
                bad
            );
        }
    }

    // -------------------------------------------------------------------------
    // Header composition tests
    // -------------------------------------------------------------------------

    struct NoopTransport;

    #[async_trait]
    impl HttpTransport for NoopTransport {
        async fn get(
            &self,
            _url: &str,
            _headers: &HeaderMap,
        ) -> Result<RawResponse, crate::error::TransportError> {
            unreachable!("header composition tests never hit the transport")
        }
    }

    #[test]
    fn test_compose_headers_default_accept() {
        let client = FrameClient::new(RetrievalConfig::new("https://example.com"), NoopTransport);
        let headers = client.compose_headers(DEFAULT_FRAME_ACCEPT);

        assert_eq!(
            headers.get(ACCEPT).unwrap(),
            "multipart/related; type=application/octet-stream"
        );
    }

    #[test]
    fn test_compose_headers_configured_accept_wins() {
        let config = RetrievalConfig::new("https://example.com")
            .with_header(ACCEPT, HeaderValue::from_static("application/dicom"));
        let client = FrameClient::new(config, NoopTransport);

        let headers = client.compose_headers(DEFAULT_FRAME_ACCEPT);
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/dicom");
    }

    #[test]
    fn test_compose_headers_extra_headers_carried() {
        let config = RetrievalConfig::new("https://example.com").with_header(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer token"),
        );
        let client = FrameClient::new(config, NoopTransport);

        let headers = client.compose_headers(DEFAULT_FRAME_ACCEPT);
        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get(http::header::AUTHORIZATION).unwrap(),
            "Bearer token"
        );
    }
}
