//! Persistence contract for credential records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::credentials_model::{Broker, CredentialRecord};
use crate::errors::Result;

/// Trait for credential persistence operations.
///
/// One record per user per broker; the store enforces row-level access
/// for interactive callers. `list_for_broker` is the service-level view
/// used by the scheduled batch, where no interactive user session exists.
#[async_trait]
pub trait CredentialRepositoryTrait: Send + Sync {
    fn get(&self, user_id: &str, broker: Broker) -> Result<Option<CredentialRecord>>;

    /// All credential records for a broker, across users (elevated access).
    fn list_for_broker(&self, broker: Broker) -> Result<Vec<CredentialRecord>>;

    async fn upsert(&self, record: CredentialRecord) -> Result<CredentialRecord>;

    /// Record a successful sync on the credential row.
    async fn touch_last_sync(
        &self,
        user_id: &str,
        broker: Broker,
        at: DateTime<Utc>,
    ) -> Result<()>;
}
