//! # WADO-RS Frame Client
//!
//! A specialized client for retrieving DICOM image frame data over WADO-RS
//! from AWS HealthImaging, whose `multipart/related` responses deviate from
//! the multipart specification.
//!
//! ## Features
//!
//! - **Frame retrieval**: single-frame WADO-RS GET with the non-standard
//!   `Accept: multipart/related; type=application/octet-stream` header the
//!   server requires
//! - **Multipart repair**: tolerant byte-level re-framing of malformed
//!   multipart bodies into ordered frame buffers, with partial recovery
//! - **URI construction**: pure builders for instance/frame resource URIs
//!   and `wadors:` image identifiers
//! - **Transport seam**: retrieval logic is generic over an [`HttpTransport`]
//!   trait, so it is testable without a live server
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`uri`] - pure WADO-RS URI builders
//! - [`multipart`] - byte-level multipart repair
//! - [`client`] - frame retrieval client and HTTP transport seam
//! - [`config`] - client configuration
//! - [`error`] - error taxonomies
//!
//! ## Example
//!
//! ```ignore
//! use wado_frame_client::{
//!     FrameClient, FrameRequest, FrameRetrieval, InstanceReference,
//!     ReqwestTransport, RetrievalConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RetrievalConfig::new("https://dicom.us-east-1.amazonaws.com/datastore/abc");
//!     config.validate()?;
//!
//!     let client = FrameClient::new(config, ReqwestTransport::new());
//!     let instance = InstanceReference::new("1.2.3", "4.5.6", "7.8.9");
//!
//!     let frames = client.retrieve_frame(FrameRequest::new(instance, 1)).await?;
//!     println!("frame is {} bytes", frames[0].len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod multipart;
pub mod uri;

// Re-export commonly used types
pub use client::{
    FrameClient, FramePayload, FrameRequest, FrameRetrieval, FrameSelector, HttpTransport,
    RawResponse, ReqwestTransport,
};
pub use config::{RetrievalConfig, DEFAULT_BULKDATA_ACCEPT, DEFAULT_FRAME_ACCEPT};
pub use error::{ConfigError, MultipartError, RetrieveError, TransportError};
pub use multipart::{boundary_from_content_type, infer_boundary, repair};
pub use uri::{frame_resource_uri, instance_resource_uri, wadors_image_id, InstanceReference};
