//! # Error Types
//!
//! Errors raised locally, before anything is sent to the gateway.
//!
//! Failures reported by the gateway, and failures to reach it at all, are not
//! errors in this sense: they arrive as a [`Response`](crate::response::Response)
//! through the normal result path.

use thiserror::Error;

/// Main error type for kkmserver-client operations
#[derive(Debug, Error)]
pub enum KkmError {
    /// The command object has no (or an empty) `Command` field
    #[error("Invalid command shape: {0}")]
    InvalidCommandShape(String),

    /// A result lookup was requested but no command has been executed yet
    #[error("No prior command to look up a result for")]
    NoPriorCommand,

    /// Device numbers are 0 (first free device) through 9
    #[error("Device number {0} out of range 0-9")]
    DeviceNumberOutOfRange(u8),

    /// The gateway accepts correlation ids of at most 40 characters
    #[error("Correlation id too long: {0} characters (max 40)")]
    CorrelationIdTooLong(usize),

    /// The configured base URL cannot be parsed or joined
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// `execute` was called outside a tokio runtime
    #[error("No async runtime available to run the request")]
    NoRuntime,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A command could not be turned into JSON
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = KkmError> = std::result::Result<T, E>;
