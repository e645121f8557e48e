//! Error types for the TaskTick client

use thiserror::Error;

/// Main error type for TaskTick client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (socket never opened or dropped)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error during serialization/deserialization of wire frames
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP request to the login/register collaborator failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server URL could not be turned into a WebSocket endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The connection driver has shut down; no further sends are possible
    #[error("Connection closed")]
    ConnectionClosed,

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ClientError
pub type ClientResult<T> = Result<T, ClientError>;
