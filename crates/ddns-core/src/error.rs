//! Error types for the DDNS updater
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid local configuration (credential files, flags)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The current address could not be determined
    #[error("Address resolution error: {0}")]
    Resolution(String),

    /// Transport failure talking to a remote service
    /// (DNS resolution, timeout, connection refused)
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success HTTP status
    #[error("{context} (HTTP {status}): {body}")]
    Provider {
        /// HTTP status code
        status: u16,
        /// What failed and how the status reads
        context: String,
        /// Raw response body
        body: String,
    },

    /// The requested record or zone does not exist on the provider
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The provider answered with a success status but an unusable body
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The local cache content could not be parsed
    ///
    /// Never fatal: cache readers degrade to a cache miss.
    #[error("Cache corrupted: {0}")]
    CacheCorruption(String),

    /// The local cache could not be written
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an address resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a provider error from an HTTP status and body
    pub fn provider(status: u16, body: impl Into<String>) -> Self {
        Self::provider_with_context(status, "Provider error", body)
    }

    /// Create a provider error with a description of the failed request
    pub fn provider_with_context(
        status: u16,
        context: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Provider {
            status,
            context: context.into(),
            body: body.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a cache corruption error
    pub fn cache_corruption(msg: impl Into<String>) -> Self {
        Self::CacheCorruption(msg.into())
    }

    /// Create a cache write error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Whether this error means "the remote record does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error stems from local configuration
    ///
    /// The binary uses this to pick its exit code.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
