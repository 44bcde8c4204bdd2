use thiserror::Error;

/// Errors raised by the HTTP transport layer.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network or connection error before a response was received
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request URL could not be parsed by the transport
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be read
    #[error("Body read error: {0}")]
    Body(String),
}

/// Errors related to multipart/related body repair.
#[derive(Debug, Clone, Error)]
pub enum MultipartError {
    /// No valid part could be located anywhere in the body
    #[error("No parts recovered from multipart body ({size} bytes scanned)")]
    NoPartsRecovered { size: usize },
}

/// Errors returned by frame retrieval operations.
#[derive(Debug, Clone, Error)]
pub enum RetrieveError {
    /// Frame number failed to resolve to a positive integer.
    /// Detected before any network call.
    #[error("Invalid frame number: {value:?}")]
    InvalidFrameNumber { value: String },

    /// The server answered with a non-2xx status. Terminal for this call;
    /// retry policy belongs to the caller.
    #[error("Retrieval failed: HTTP status {status}")]
    Failed { status: u16 },

    /// Network-level failure with no usable response
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A declared-multipart body yielded no recoverable parts
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

/// Errors detected when validating a [`RetrievalConfig`](crate::RetrievalConfig).
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Base URL is empty
    #[error("Base URL is required")]
    EmptyBaseUrl,

    /// Base URL is not an absolute http(s) URL
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
