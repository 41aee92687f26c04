//! Event registry error types

use thiserror::Error;

/// Event registry error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Record conflicts with an existing one (duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Event has no remaining tickets
    #[error("No tickets available")]
    NoCapacity,

    /// User already joined the event
    #[error("User already joined the event")]
    AlreadyRegistered,

    /// Caller is not allowed to modify the record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, malformed, or expired bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Cryptographic error
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for event registry operations
pub type Result<T> = std::result::Result<T, Error>;
