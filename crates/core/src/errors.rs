//! Core error types for the portfolio sync engine.
//!
//! This module defines storage-agnostic error types. Broker protocol
//! errors live in `finfolio-brokers` and are wrapped here; store-specific
//! errors are converted to these types by the hosting application.

use thiserror::Error;

use finfolio_brokers::{BrokerError, FailureAdvice};

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Required process-wide configuration is missing or malformed.
    /// Fatal and not retryable (e.g. no encryption key at startup).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored credentials could not be decrypted: the blob was tampered
    /// with or the key is wrong. Surfaced as "reconfigure credentials".
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A broker protocol operation failed.
    #[error("Broker operation failed: {0}")]
    Broker(#[from] BrokerError),

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A store operation failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Unexpected error.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// How this failure should be surfaced to the user.
    ///
    /// Broker failures carry their own classification; vault
    /// authentication failures map to the same "reconfigure credentials"
    /// guidance as a broker signature rejection.
    pub fn advice(&self) -> FailureAdvice {
        match self {
            Self::Authentication(_) => FailureAdvice::ReconfigureCredentials,
            Self::Broker(broker_error) => broker_error.advice(),
            Self::Configuration(_)
            | Self::Validation(_)
            | Self::Repository(_)
            | Self::Unexpected(_) => FailureAdvice::ShowBrokerMessage,
        }
    }
}

/// Validation errors for inputs crossing the engine's boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
