//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Status transition rejected by the server
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Upstream persistence failed, retry is safe
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Snapshot load failed
    #[error("Load failed: {0}")]
    Load(String),

    /// Event channel error
    #[error("Channel error: {0}")]
    Channel(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
