//! Error taxonomy for the metrics client
//!
//! - [`ValidationError`]: rejected client-side, never reaches the network
//! - [`FetchError`]: transport failure or non-2xx response, carrying the
//!   message shown to the user
//! - An empty result is not an error; it is a loaded dataset with no records

use thiserror::Error;

/// Fallback when a failed response carries no usable `detail`
pub const FETCH_FALLBACK_MESSAGE: &str = "Failed to fetch data";

/// Shown when the service cannot be reached or returns an unreadable body
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the metrics service. Please check your connection.";

/// A fetch that did not produce records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request failed; `message` is user-facing
    #[error("{message}")]
    Failed { message: String },
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        FetchError::Failed {
            message: message.into(),
        }
    }

    pub fn connectivity() -> Self {
        FetchError::failed(CONNECTIVITY_MESSAGE)
    }

    pub fn message(&self) -> &str {
        match self {
            FetchError::Failed { message } => message,
        }
    }
}

/// Failure below the HTTP layer (connect, TLS, body read)
#[derive(Debug, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        TransportError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Analyze submission rejected before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a repository path")]
    MissingRepoPath,
    #[error("Please select a ZIP file")]
    NotAZipFile,
    #[error("Please provide either a repository path or a ZIP file, not both")]
    ConflictingSources,
    #[error("Failed to read {path}: {reason}")]
    UnreadableArchive { path: String, reason: String },
}
