//! Error types and user-facing failure classification for broker clients.
//!
//! This module provides:
//! - [`BrokerError`]: the main error enum for all broker protocol operations
//! - [`FailureAdvice`]: classification for how a failure should be surfaced

mod advice;

pub use advice::FailureAdvice;

use thiserror::Error;

/// Errors that can occur while talking to an external broker.
///
/// Each variant is classified into a [`FailureAdvice`] via the
/// [`advice`](Self::advice) method, which determines how the failure is
/// presented to the user by the sync layer.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The broker throttled the request.
    /// Not retried within the call; the next scheduled run will try again.
    #[error("Rate limited by {broker}")]
    RateLimited {
        /// The broker that throttled the request
        broker: String,
    },

    /// The report never became ready within the attempt budget.
    #[error("Timed out waiting for {broker} after {attempts} attempts")]
    Timeout {
        /// The broker that timed out
        broker: String,
        /// Number of poll attempts made before giving up
        attempts: u32,
    },

    /// A required endpoint returned an unexpected response shape or content.
    /// Carries the broker's own message when one was available.
    #[error("Protocol error from {broker} ({endpoint}): {message}")]
    Protocol {
        /// The broker that returned the error
        broker: String,
        /// The endpoint or protocol phase that failed
        endpoint: String,
        /// The broker's error message, or a description of the failure
        message: String,
    },

    /// The broker rejected the request's credentials or signature.
    #[error("Authentication rejected by {broker}: {message}")]
    Authentication {
        /// The broker that rejected the credentials
        broker: String,
        /// The broker's rejection message
        message: String,
    },

    /// A network error occurred while communicating with the broker.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl BrokerError {
    /// Returns how this failure should be surfaced to the user.
    ///
    /// # Examples
    ///
    /// ```
    /// use finfolio_brokers::errors::{BrokerError, FailureAdvice};
    ///
    /// let error = BrokerError::RateLimited { broker: "BINANCE".to_string() };
    /// assert_eq!(error.advice(), FailureAdvice::TryAgainLater);
    /// ```
    pub fn advice(&self) -> FailureAdvice {
        match self {
            Self::RateLimited { .. } => FailureAdvice::TryAgainLater,
            Self::Timeout { .. } => FailureAdvice::TryAgainLonger,
            Self::Authentication { .. } => FailureAdvice::ReconfigureCredentials,
            Self::Protocol { .. } | Self::Network(_) => FailureAdvice::ShowBrokerMessage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_advises_try_later() {
        let error = BrokerError::RateLimited {
            broker: "IBKR_FLEX".to_string(),
        };
        assert_eq!(error.advice(), FailureAdvice::TryAgainLater);
    }

    #[test]
    fn test_timeout_advises_try_longer() {
        let error = BrokerError::Timeout {
            broker: "IBKR_FLEX".to_string(),
            attempts: 30,
        };
        assert_eq!(error.advice(), FailureAdvice::TryAgainLonger);
    }

    #[test]
    fn test_authentication_advises_reconfigure() {
        let error = BrokerError::Authentication {
            broker: "BINANCE".to_string(),
            message: "Invalid API-key".to_string(),
        };
        assert_eq!(error.advice(), FailureAdvice::ReconfigureCredentials);
    }

    #[test]
    fn test_protocol_shows_broker_message() {
        let error = BrokerError::Protocol {
            broker: "BINANCE".to_string(),
            endpoint: "/api/v3/account".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(error.advice(), FailureAdvice::ShowBrokerMessage);
    }

    #[test]
    fn test_error_display() {
        let error = BrokerError::Timeout {
            broker: "IBKR_FLEX".to_string(),
            attempts: 30,
        };
        assert_eq!(
            format!("{}", error),
            "Timed out waiting for IBKR_FLEX after 30 attempts"
        );

        let error = BrokerError::Protocol {
            broker: "BINANCE".to_string(),
            endpoint: "/api/v3/account".to_string(),
            message: "HTTP 502: Bad Gateway".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Protocol error from BINANCE (/api/v3/account): HTTP 502: Bad Gateway"
        );
    }
}
