//! Error types for the explorer

use thiserror::Error;

/// Result type alias for explorer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when the taxa API answers 503.
pub const UNAVAILABLE_MESSAGE: &str =
    "iNaturalist API is currently unavailable. Please try again later.";

/// Errors that can occur while searching, rendering or caching
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to build the HTTP client or another long-lived resource
    #[error("Initialization failed: {0}")]
    InitializationError(String),

    /// The query could not be turned into a request
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Transport-level failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The API answered 503
    #[error("{}", UNAVAILABLE_MESSAGE)]
    ServiceUnavailable,

    /// The API answered with another non-success status
    #[error("Network response was not ok (status {0})")]
    HttpStatus(u16),

    /// The response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// A postcard image could not be fetched or decoded
    #[error("Failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    /// Failed to compose or encode an image
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Offline cache failure
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error came from talking to the API rather than from local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::NetworkError(_) | Error::ServiceUnavailable | Error::HttpStatus(_) | Error::DecodeError(_)
        )
    }
}
