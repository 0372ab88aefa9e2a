//! Persistence contracts for holdings, cash, positions and transactions.
//!
//! The destination store only needs keyed get/upsert semantics; identity
//! keys make upserts commutative under concurrent batch writers. The sync
//! engine reads before writing so it can report created vs updated.

use std::collections::HashSet;

use async_trait::async_trait;

use super::holdings_model::{CashBalance, Holding, Position, Transaction, TransactionKey};
use crate::errors::Result;

#[async_trait]
pub trait HoldingRepositoryTrait: Send + Sync {
    fn get(&self, user_id: &str, source: &str, external_id: &str) -> Result<Option<Holding>>;
    fn list_for_user(&self, user_id: &str, source: &str) -> Result<Vec<Holding>>;
    async fn upsert(&self, holding: Holding) -> Result<Holding>;
}

#[async_trait]
pub trait CashBalanceRepositoryTrait: Send + Sync {
    fn get(&self, user_id: &str, source: &str, currency: &str) -> Result<Option<CashBalance>>;
    async fn upsert(&self, balance: CashBalance) -> Result<CashBalance>;
}

#[async_trait]
pub trait PositionRepositoryTrait: Send + Sync {
    fn get(&self, user_id: &str, external_security_id: &str) -> Result<Option<Position>>;
    async fn upsert(&self, position: Position) -> Result<Position>;
}

#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Dedupe keys already stored for the given holdings, fetched in one
    /// call so inserts do not pay a round-trip per candidate.
    fn existing_keys(
        &self,
        user_id: &str,
        holding_refs: &[String],
    ) -> Result<HashSet<TransactionKey>>;

    /// Insert transactions that passed deduplication.
    async fn insert_batch(&self, transactions: Vec<Transaction>) -> Result<usize>;
}
