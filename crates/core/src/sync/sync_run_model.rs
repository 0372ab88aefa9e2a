//! Sync run domain models.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::credentials::Broker;
use crate::errors::Result;

/// Outcome of a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncRunStatus {
    Success,
    Error,
}

/// Portfolio totals computed during one sync pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTotals {
    pub positions_count: u32,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    pub cash_by_currency: HashMap<String, Decimal>,
}

/// One entry of the append-only sync audit trail.
///
/// One entry per attempt, success or failure, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: String,
    pub user_id: String,
    pub broker: Broker,
    pub positions_count: u32,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    pub cash_by_currency: HashMap<String, Decimal>,
    pub status: SyncRunStatus,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SyncRun {
    /// Record a successful attempt with its computed totals.
    pub fn success(user_id: String, broker: Broker, totals: SyncTotals) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            broker,
            positions_count: totals.positions_count,
            total_value: totals.total_value,
            total_cost: totals.total_cost,
            total_pnl: totals.total_pnl,
            cash_by_currency: totals.cash_by_currency,
            status: SyncRunStatus::Success,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// Record a failed attempt with the error's message.
    pub fn failure(user_id: String, broker: Broker, error_message: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            broker,
            positions_count: 0,
            total_value: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            cash_by_currency: HashMap::new(),
            status: SyncRunStatus::Error,
            error_message: Some(error_message),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for the append-only sync history.
#[async_trait]
pub trait SyncRunRepositoryTrait: Send + Sync {
    /// Append one run; entries are immutable once written.
    async fn append(&self, run: SyncRun) -> Result<SyncRun>;

    /// Recent runs for a user, newest first.
    fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<SyncRun>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_success_run_carries_totals() {
        let mut cash = HashMap::new();
        cash.insert("USD".to_string(), dec!(120.5));

        let run = SyncRun::success(
            "user-1".to_string(),
            Broker::Binance,
            SyncTotals {
                positions_count: 3,
                total_value: dec!(1500),
                total_cost: dec!(1200),
                total_pnl: dec!(300),
                cash_by_currency: cash,
            },
        );

        assert_eq!(run.status, SyncRunStatus::Success);
        assert_eq!(run.positions_count, 3);
        assert_eq!(run.total_pnl, dec!(300));
        assert!(run.error_message.is_none());
        assert!(!run.id.is_empty());
    }

    #[test]
    fn test_failure_run_is_empty_except_message() {
        let run = SyncRun::failure(
            "user-1".to_string(),
            Broker::IbkrFlex,
            "Token has expired.".to_string(),
        );

        assert_eq!(run.status, SyncRunStatus::Error);
        assert_eq!(run.error_message.as_deref(), Some("Token has expired."));
        assert_eq!(run.total_value, Decimal::ZERO);
        assert!(run.cash_by_currency.is_empty());
    }
}
