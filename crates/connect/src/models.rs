//! Response models for sync operations.

use finfolio_brokers::binance::FetchOptions;
use finfolio_core::sync::SyncTotals;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a sync was triggered.
///
/// The scheduled variant skips the per-asset trade-history pass: batches
/// run inside the exchange's shared rate budget, so cost basis is only
/// refreshed on interactive syncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    OnDemand,
    Scheduled,
}

impl SyncMode {
    pub fn fetch_options(self) -> FetchOptions {
        FetchOptions {
            include_cost_basis: self == SyncMode::OnDemand,
        }
    }
}

/// Result surfaced to the caller of a sync entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub success: bool,
    pub created: usize,
    pub updated: usize,
    /// External records processed (created + updated + skipped).
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncSummary {
    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            created: 0,
            updated: 0,
            total: 0,
            total_value_usd: None,
            error: Some(error),
        }
    }
}

/// One user's result inside a scheduled batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSyncOutcome {
    pub user_id: String,
    pub summary: SyncSummary,
}

/// What one reconciliation pass did to the store.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub transactions_inserted: usize,
    pub totals: SyncTotals,
}

impl ReconcileOutcome {
    pub fn records_processed(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}
