//! Error types for the change feed engine
//!
//! Every failure surfaced by the feed goes through [`FeedError`]. The
//! categories are coarse on purpose: callers decide retry policy, so the
//! only question they need answered is "was this transient".
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for change feed operations
pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// Error types for the change feed engine
#[derive(Debug, Error)]
pub enum FeedError {
    /// Storage backend unreachable or a transient read failure
    ///
    /// Never retried inside the engine.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Human readable description
        message: String,
        /// Underlying backend error, if one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Deployment defect: no strategy for a schema version, duplicate
    /// registration, a procedure the applied schema lacks, or an invalid
    /// configuration value
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Operation aborted through its cancellation token
    #[error("operation cancelled")]
    Cancelled,

    /// Caller supplied arguments the contract rejects
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation does not exist for the active schema version
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A stored row could not be decoded into a feed entry
    #[error("data corruption: {0}")]
    Corruption(String),
}

impl FeedError {
    /// Storage failure without an underlying source
    pub fn store(message: impl Into<String>) -> Self {
        FeedError::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Storage failure wrapping a backend error
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FeedError::StoreUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        FeedError::Configuration(message.into())
    }

    /// Invalid caller input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        FeedError::InvalidInput(message.into())
    }

    /// Operation not available in this schema version
    pub fn unsupported(message: impl Into<String>) -> Self {
        FeedError::Unsupported(message.into())
    }

    /// Undecodable stored data
    pub fn corruption(message: impl Into<String>) -> Self {
        FeedError::Corruption(message.into())
    }

    /// Whether a caller may reasonably retry the same request
    ///
    /// Only storage unavailability is transient. Everything else fails the
    /// same way on every attempt.
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(self, FeedError::StoreUnavailable { .. })
    }

    /// Whether this error was caused by cancellation
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FeedError::Cancelled)
    }
}
