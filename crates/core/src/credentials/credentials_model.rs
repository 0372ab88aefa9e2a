//! Credential domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// The external brokers the sync engine can speak to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Broker {
    /// The brokerage Flex statement service (request/poll reports).
    IbkrFlex,
    /// The crypto exchange REST API (signed requests).
    Binance,
}

impl Broker {
    /// Stable identifier used as the `source` of stored entities.
    pub fn as_str(&self) -> &'static str {
        match self {
            Broker::IbkrFlex => "IBKR_FLEX",
            Broker::Binance => "BINANCE",
        }
    }
}

impl std::fmt::Display for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored credentials for one user and one broker.
///
/// Secret fields are opaque encrypted blobs; plaintext exists only
/// transiently in memory during a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub user_id: String,
    pub broker: Broker,
    /// Encrypted primary secret (Flex: token; exchange: API key).
    pub encrypted_primary: String,
    /// Encrypted secondary secret (Flex: query id; exchange: API secret).
    pub encrypted_secondary: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Decrypted credential pair, alive only for the duration of one sync.
///
/// Deliberately has no `Debug` or `Serialize` derive: the fields must not
/// end up in logs or payloads.
#[derive(Clone)]
pub struct PlainCredentials {
    pub primary: String,
    pub secondary: Option<String>,
}

impl PlainCredentials {
    /// Validates the credential fields before they are encrypted.
    pub fn validate(&self) -> Result<()> {
        if self.primary.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "primary secret".to_string(),
            )));
        }
        if let Some(secondary) = &self.secondary {
            if secondary.trim().is_empty() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Secondary secret must not be empty when provided".to_string(),
                )));
            }
        }
        Ok(())
    }

    /// The secondary secret, required by brokers that need a pair.
    pub fn require_secondary(&self) -> Result<&str> {
        self.secondary
            .as_deref()
            .ok_or_else(|| Error::Authentication("Stored credentials are missing a field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_identifiers_are_stable() {
        assert_eq!(Broker::IbkrFlex.as_str(), "IBKR_FLEX");
        assert_eq!(Broker::Binance.as_str(), "BINANCE");
        assert_eq!(Broker::Binance.to_string(), "BINANCE");
    }

    #[test]
    fn test_validate_rejects_empty_primary() {
        let plain = PlainCredentials {
            primary: "  ".to_string(),
            secondary: None,
        };
        assert!(plain.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_secondary() {
        let plain = PlainCredentials {
            primary: "token".to_string(),
            secondary: Some(String::new()),
        };
        assert!(plain.validate().is_err());
    }

    #[test]
    fn test_require_secondary() {
        let plain = PlainCredentials {
            primary: "key".to_string(),
            secondary: Some("secret".to_string()),
        };
        assert_eq!(plain.require_secondary().unwrap(), "secret");

        let plain = PlainCredentials {
            primary: "key".to_string(),
            secondary: None,
        };
        assert!(plain.require_secondary().is_err());
    }
}
