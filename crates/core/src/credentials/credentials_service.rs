//! Service for storing and recovering broker credentials.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use super::credentials_model::{Broker, CredentialRecord, PlainCredentials};
use super::credentials_traits::CredentialRepositoryTrait;
use crate::errors::Result;
use crate::vault::SecretVault;

/// Encrypts credentials on the way into the store and decrypts them for
/// the duration of a sync. The vault is injected so the service can be
/// exercised with a synthetic key.
pub struct CredentialService {
    repository: Arc<dyn CredentialRepositoryTrait>,
    vault: Arc<SecretVault>,
}

impl CredentialService {
    pub fn new(repository: Arc<dyn CredentialRepositoryTrait>, vault: Arc<SecretVault>) -> Self {
        Self { repository, vault }
    }

    /// Encrypt and upsert one user's credentials for a broker.
    pub async fn save_credentials(
        &self,
        user_id: &str,
        broker: Broker,
        plain: PlainCredentials,
    ) -> Result<CredentialRecord> {
        plain.validate()?;

        let encrypted_primary = self.vault.encrypt(&plain.primary)?;
        let encrypted_secondary = plain
            .secondary
            .as_deref()
            .map(|secret| self.vault.encrypt(secret))
            .transpose()?;

        let existing = self.repository.get(user_id, broker)?;
        let record = CredentialRecord {
            user_id: user_id.to_string(),
            broker,
            encrypted_primary,
            encrypted_secondary,
            last_sync_at: existing.and_then(|record| record.last_sync_at),
            updated_at: Utc::now(),
        };

        let saved = self.repository.upsert(record).await?;
        info!("Saved {} credentials for user {}", broker, user_id);
        Ok(saved)
    }

    /// Decrypt a stored record into its transient plaintext pair.
    ///
    /// Fails with an authentication error when the blobs were tampered
    /// with or the process key changed; the caller surfaces that as
    /// "reconfigure credentials".
    pub fn decrypt_credentials(&self, record: &CredentialRecord) -> Result<PlainCredentials> {
        let primary = self.vault.decrypt(&record.encrypted_primary)?;
        let secondary = record
            .encrypted_secondary
            .as_deref()
            .map(|blob| self.vault.decrypt(blob))
            .transpose()?;

        Ok(PlainCredentials { primary, secondary })
    }
}
