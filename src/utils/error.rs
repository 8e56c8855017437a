//! Error handling for the signal scanner.

use thiserror::Error;

/// Main error type for the signal scanner
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A signal source could not produce a score
    #[error("Source error: {0}")]
    SourceError(String),

    /// The outbound alert channel rejected or failed to deliver a message
    #[error("Dispatch error: {0}")]
    DispatchError(String),

    /// Data-related errors (e.g. missing or malformed provider responses)
    #[error("Data error: {0}")]
    DataError(String),

    /// Connection / network errors
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Request errors
    #[error("Request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for the signal scanner
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<web3::Error> for Error {
    fn from(err: web3::Error) -> Self {
        Error::ConnectionError(format!("web3: {}", err))
    }
}

impl From<solana_client::client_error::ClientError> for Error {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Error::ConnectionError(format!("solana rpc: {}", err))
    }
}
