//! # FeedError
//!
//! Centralized error handling for the Rusty-Feed crates.

use thiserror::Error;

/// The primary error type for all rf-core and rf-services operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Input could not be read as a timestamp
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// Draft rejected before it reached the backend (e.g., empty, too long)
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend reported a failure or rejected the request
    #[error("backend error: {0}")]
    Backend(String),

    /// A timer-owning operation was used outside a tokio runtime
    #[error("{0} requires a running tokio runtime")]
    RuntimeUnavailable(&'static str),
}

/// A specialized Result type for Rusty-Feed logic.
pub type Result<T> = std::result::Result<T, FeedError>;
