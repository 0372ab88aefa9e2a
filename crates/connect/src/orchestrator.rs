//! Centralized sync orchestrator.
//!
//! Runs the full per-user flow: load credentials, decrypt, fetch from the
//! broker, reconcile into the store, record the attempt. Two entry modes:
//! on-demand for a single authenticated user, and scheduled over every
//! user with stored credentials for a broker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{error, info};

use finfolio_core::credentials::{Broker, CredentialRepositoryTrait, CredentialService};
use finfolio_core::errors::{Error, Result, ValidationError};
use finfolio_core::sync::{SyncRun, SyncRunRepositoryTrait, SyncTotals};

use crate::models::{SyncMode, SyncSummary, UserSyncOutcome};
use crate::service::HoldingsSyncService;
use crate::traits::{BrokerageStatementClient, ExchangePortfolioClient};

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Pause between users in a scheduled batch, so a batch never bursts
    /// through a shared rate limit.
    pub user_pacing: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            user_pacing: Duration::from_secs(2),
        }
    }
}

/// Orchestrates broker data synchronization.
///
/// # Example
///
/// ```ignore
/// let orchestrator = SyncOrchestrator::new(
///     credential_service,
///     credential_repository,
///     statement_client,
///     portfolio_client,
///     sync_service,
///     history,
///     SyncConfig::default(),
/// );
/// let summary = orchestrator.sync_user("user-1", Broker::Binance).await?;
/// ```
pub struct SyncOrchestrator {
    credential_service: Arc<CredentialService>,
    credentials: Arc<dyn CredentialRepositoryTrait>,
    statement_client: Arc<dyn BrokerageStatementClient>,
    portfolio_client: Arc<dyn ExchangePortfolioClient>,
    sync_service: Arc<HoldingsSyncService>,
    history: Arc<dyn SyncRunRepositoryTrait>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        credential_service: Arc<CredentialService>,
        credentials: Arc<dyn CredentialRepositoryTrait>,
        statement_client: Arc<dyn BrokerageStatementClient>,
        portfolio_client: Arc<dyn ExchangePortfolioClient>,
        sync_service: Arc<HoldingsSyncService>,
        history: Arc<dyn SyncRunRepositoryTrait>,
        config: SyncConfig,
    ) -> Self {
        Self {
            credential_service,
            credentials,
            statement_client,
            portfolio_client,
            sync_service,
            history,
            config,
        }
    }

    /// On-demand sync for one authenticated user.
    ///
    /// The attempt is recorded in history either way; the error itself is
    /// propagated so the caller can show it directly.
    pub async fn sync_user(&self, user_id: &str, broker: Broker) -> Result<SyncSummary> {
        self.run_user_sync(user_id, broker, SyncMode::OnDemand).await
    }

    /// Scheduled batch over every user with stored credentials.
    ///
    /// Failures are caught and recorded per user; one user's failure
    /// never aborts the rest of the batch.
    pub async fn sync_all_users(&self, broker: Broker) -> Result<Vec<UserSyncOutcome>> {
        let records = self.credentials.list_for_broker(broker)?;
        info!(
            "Starting scheduled {} sync for {} users",
            broker,
            records.len()
        );

        let mut outcomes = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.user_pacing).await;
            }

            let user_id = record.user_id;
            let summary = match self
                .run_user_sync(&user_id, broker, SyncMode::Scheduled)
                .await
            {
                Ok(summary) => summary,
                Err(sync_error) => {
                    error!("Scheduled sync failed for user {}: {}", user_id, sync_error);
                    SyncSummary::failed(sync_error.to_string())
                }
            };
            outcomes.push(UserSyncOutcome { user_id, summary });
        }

        let failures = outcomes
            .iter()
            .filter(|outcome| !outcome.summary.success)
            .count();
        info!(
            "Scheduled {} sync finished: {} users, {} failed",
            broker,
            outcomes.len(),
            failures
        );

        Ok(outcomes)
    }

    async fn run_user_sync(
        &self,
        user_id: &str,
        broker: Broker,
        mode: SyncMode,
    ) -> Result<SyncSummary> {
        match self.fetch_and_reconcile(user_id, broker, mode).await {
            Ok((summary, totals)) => {
                self.history
                    .append(SyncRun::success(user_id.to_string(), broker, totals))
                    .await?;
                self.credentials
                    .touch_last_sync(user_id, broker, Utc::now())
                    .await?;
                Ok(summary)
            }
            Err(sync_error) => {
                let run =
                    SyncRun::failure(user_id.to_string(), broker, sync_error.to_string());
                if let Err(history_error) = self.history.append(run).await {
                    error!(
                        "Failed to record sync failure for user {}: {}",
                        user_id, history_error
                    );
                }
                Err(sync_error)
            }
        }
    }

    /// The sequential per-user flow; plaintext credentials live only
    /// inside this call.
    async fn fetch_and_reconcile(
        &self,
        user_id: &str,
        broker: Broker,
        mode: SyncMode,
    ) -> Result<(SyncSummary, SyncTotals)> {
        let record = self.credentials.get(user_id, broker)?.ok_or_else(|| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "No stored {} credentials for this user",
                broker
            )))
        })?;
        let plain = self.credential_service.decrypt_credentials(&record)?;

        let (outcome, total_value_usd) = match broker {
            Broker::IbkrFlex => {
                let query_id = plain.require_secondary()?;
                let statement = self
                    .statement_client
                    .fetch_statement(&plain.primary, query_id)
                    .await?;
                let outcome = self
                    .sync_service
                    .reconcile_statement(user_id, &statement)
                    .await?;
                (outcome, None)
            }
            Broker::Binance => {
                let api_secret = plain.require_secondary()?;
                let portfolio = self
                    .portfolio_client
                    .fetch_portfolio(&plain.primary, api_secret, mode.fetch_options())
                    .await?;
                let outcome = self
                    .sync_service
                    .reconcile_exchange(user_id, &portfolio)
                    .await?;
                (outcome, Some(portfolio.total_value_usd))
            }
        };

        let summary = SyncSummary {
            success: true,
            created: outcome.created,
            updated: outcome.updated,
            total: outcome.records_processed(),
            total_value_usd,
            error: None,
        };
        Ok((summary, outcome.totals))
    }
}
