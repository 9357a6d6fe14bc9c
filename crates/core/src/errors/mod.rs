//! Error types and Result alias for the wallet runner

use crate::types::CurrencyDays;
use thiserror::Error;

/// Main error type for the wallet runner
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Session extraction failed: cookie '{0}' missing from handshake")]
    SessionExtractionFailed(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("HTTP request failed with status {0}")]
    HttpStatus(u16),

    #[error("API returned code {code}: {message}")]
    ApplicationError { code: i64, message: String },

    #[error("Task '{0}' has no click-tracking id")]
    MissingTaskIdentifier(String),

    #[error("Task completion returned no user task id, even after retry")]
    EmptyCompletionRetryExhausted,

    #[error("No membership matches '{0}'")]
    NoMatchFound(String),

    #[error("Insufficient balance: need {required} days, have {available} days")]
    InsufficientBalance {
        required: CurrencyDays,
        available: CurrencyDays,
    },

    #[error("{0} is out of stock today")]
    OutOfStock(String),

    #[error("Redemption rejected: {0}")]
    RedemptionRejected(String),

    #[error("No membership exchanged")]
    NothingExchanged,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("License rejected: {0}")]
    LicenseRejected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// Build an application error from a provider response code
    pub fn application(code: i64, message: Option<String>) -> Self {
        Error::ApplicationError {
            code,
            message: message.unwrap_or_else(|| "no message".to_string()),
        }
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::HttpStatus(status.as_u16()),
            None => Error::TransportError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
