//! Service reconciling fetched broker snapshots into the local store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;

use finfolio_brokers::binance::{is_stable_asset, ExchangePortfolio};
use finfolio_brokers::flex::FlexStatement;
use finfolio_core::constants::{cash_materiality_threshold, dust_value_threshold};
use finfolio_core::credentials::Broker;
use finfolio_core::holdings::{
    CashBalance, CashBalanceRepositoryTrait, Holding, HoldingRepositoryTrait, Position,
    PositionRepositoryTrait, Transaction, TransactionKind, TransactionRepositoryTrait,
};
use finfolio_core::Result;

use crate::models::ReconcileOutcome;

/// Asset class recorded for exchange holdings.
const CRYPTO_ASSET_CLASS: &str = "CRYPTO";

/// Maps external records onto local entities by their natural identity
/// keys, deciding insert vs update per record. The engine only ever adds
/// or refreshes rows; absence of a record never deletes anything.
pub struct HoldingsSyncService {
    holdings: Arc<dyn HoldingRepositoryTrait>,
    cash_balances: Arc<dyn CashBalanceRepositoryTrait>,
    positions: Arc<dyn PositionRepositoryTrait>,
    transactions: Arc<dyn TransactionRepositoryTrait>,
}

impl HoldingsSyncService {
    pub fn new(
        holdings: Arc<dyn HoldingRepositoryTrait>,
        cash_balances: Arc<dyn CashBalanceRepositoryTrait>,
        positions: Arc<dyn PositionRepositoryTrait>,
        transactions: Arc<dyn TransactionRepositoryTrait>,
    ) -> Self {
        Self {
            holdings,
            cash_balances,
            positions,
            transactions,
        }
    }

    /// Reconcile an exchange portfolio snapshot into holdings, cash and
    /// transactions.
    ///
    /// Quantities are replaced on update: the snapshot already aggregates
    /// every sub-account of the same fetch, so accumulating across passes
    /// would double-count. Stable assets above the materiality threshold
    /// are additionally promoted to a cash balance; the holding row is
    /// still written.
    pub async fn reconcile_exchange(
        &self,
        user_id: &str,
        portfolio: &ExchangePortfolio,
    ) -> Result<ReconcileOutcome> {
        let source = Broker::Binance.as_str();
        let now = Utc::now();
        let mut outcome = ReconcileOutcome::default();
        let mut stable_cash_total = Decimal::ZERO;
        let mut pending_transactions: Vec<Transaction> = Vec::new();

        for balance in &portfolio.balances {
            if balance.total.is_zero() {
                outcome.skipped += 1;
                continue;
            }

            if is_stable_asset(&balance.asset) && balance.total >= cash_materiality_threshold() {
                stable_cash_total += balance.total;
            }

            let existing = self.holdings.get(user_id, source, &balance.asset)?;
            if existing.is_none() && balance.value_usd < dust_value_threshold() {
                debug!(
                    "Skipping dust balance {} ({} USD)",
                    balance.asset, balance.value_usd
                );
                outcome.skipped += 1;
                continue;
            }

            let holding = match existing {
                Some(mut current) => {
                    current.quantity = balance.total;
                    current.current_price = balance.price_usd;
                    // Scheduled syncs skip trade history; keep the last
                    // known basis instead of erasing it.
                    current.cost_basis = balance.cost_basis.or(current.cost_basis);
                    current.last_price_update = now;
                    outcome.updated += 1;
                    current
                }
                None => {
                    outcome.created += 1;
                    Holding {
                        user_id: user_id.to_string(),
                        source: source.to_string(),
                        external_id: balance.asset.clone(),
                        symbol: balance.asset.clone(),
                        name: None,
                        asset_class: CRYPTO_ASSET_CLASS.to_string(),
                        quantity: balance.total,
                        cost_basis: balance.cost_basis,
                        current_price: balance.price_usd,
                        currency: "USD".to_string(),
                        last_price_update: now,
                    }
                }
            };

            outcome.totals.positions_count += 1;
            outcome.totals.total_value += balance.value_usd;
            if let Some(cost) = holding.cost_basis {
                let cost_total = cost * balance.total;
                outcome.totals.total_cost += cost_total;
                outcome.totals.total_pnl += balance.value_usd - cost_total;
            }

            let holding_key = holding.ref_key();
            self.holdings.upsert(holding).await?;

            for trade in &balance.trades {
                pending_transactions.push(Transaction {
                    user_id: user_id.to_string(),
                    holding_ref: holding_key.clone(),
                    kind: if trade.is_buy {
                        TransactionKind::Buy
                    } else {
                        TransactionKind::Sell
                    },
                    quantity: trade.quantity,
                    price: trade.price,
                    amount: trade.amount,
                    transaction_date: trade.executed_at,
                    source_note: Some(format!("{} trade history", source)),
                });
            }
        }

        if stable_cash_total > Decimal::ZERO {
            self.cash_balances
                .upsert(CashBalance {
                    user_id: user_id.to_string(),
                    source: source.to_string(),
                    currency: "USD".to_string(),
                    amount: stable_cash_total,
                    last_sync_at: now,
                })
                .await?;
            outcome
                .totals
                .cash_by_currency
                .insert("USD".to_string(), stable_cash_total);
        }

        outcome.transactions_inserted = self
            .insert_deduplicated(user_id, pending_transactions)
            .await?;

        info!(
            "Reconciled exchange snapshot for user {}: {} created, {} updated, {} skipped, {} transactions",
            user_id,
            outcome.created,
            outcome.updated,
            outcome.skipped,
            outcome.transactions_inserted
        );

        Ok(outcome)
    }

    /// Reconcile a brokerage statement into positions and cash balances.
    pub async fn reconcile_statement(
        &self,
        user_id: &str,
        statement: &FlexStatement,
    ) -> Result<ReconcileOutcome> {
        let source = Broker::IbkrFlex.as_str();
        let now = Utc::now();
        let mut outcome = ReconcileOutcome::default();

        for fetched in &statement.positions {
            // Zero-quantity records are not stored; existing rows stay.
            if fetched.quantity.is_zero() {
                outcome.skipped += 1;
                continue;
            }

            let existing = self.positions.get(user_id, &fetched.external_id)?;
            if existing.is_some() {
                outcome.updated += 1;
            } else {
                outcome.created += 1;
            }

            outcome.totals.positions_count += 1;
            outcome.totals.total_value += fetched.market_value;
            outcome.totals.total_cost += fetched.cost_basis_price * fetched.quantity;
            outcome.totals.total_pnl += fetched.unrealized_pnl;

            self.positions
                .upsert(Position {
                    user_id: user_id.to_string(),
                    symbol: fetched.symbol.clone(),
                    external_security_id: fetched.external_id.clone(),
                    isin: fetched.isin.clone(),
                    quantity: fetched.quantity,
                    current_price: fetched.mark_price,
                    cost_basis_price: fetched.cost_basis_price,
                    market_value: fetched.market_value,
                    unrealized_pnl: fetched.unrealized_pnl,
                    unrealized_pnl_percent: fetched.unrealized_pnl_percent,
                    asset_category: fetched.asset_category.clone(),
                    currency: fetched.currency.clone(),
                    exchange: fetched.exchange.clone(),
                    last_sync_at: now,
                })
                .await?;
        }

        let cash = &statement.cash_balances;
        for (currency, amount) in [("EUR", cash.eur), ("USD", cash.usd)] {
            let Some(amount) = amount else { continue };
            if amount.is_zero() {
                continue;
            }

            self.cash_balances
                .upsert(CashBalance {
                    user_id: user_id.to_string(),
                    source: source.to_string(),
                    currency: currency.to_string(),
                    amount,
                    last_sync_at: now,
                })
                .await?;
            outcome
                .totals
                .cash_by_currency
                .insert(currency.to_string(), amount);
        }

        info!(
            "Reconciled brokerage statement for user {}: {} created, {} updated, {} skipped",
            user_id, outcome.created, outcome.updated, outcome.skipped
        );

        Ok(outcome)
    }

    /// Insert transactions that are not already stored.
    ///
    /// Existing dedupe keys for the affected holdings are fetched as one
    /// set up front; candidates matching a key (including duplicates
    /// within the batch itself) are treated as already imported.
    async fn insert_deduplicated(
        &self,
        user_id: &str,
        candidates: Vec<Transaction>,
    ) -> Result<usize> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let holding_refs: Vec<String> = candidates
            .iter()
            .map(|transaction| transaction.holding_ref.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let mut seen = self.transactions.existing_keys(user_id, &holding_refs)?;

        let mut fresh = Vec::new();
        for transaction in candidates {
            if seen.insert(transaction.dedupe_key()) {
                fresh.push(transaction);
            } else {
                debug!(
                    "Skipping already imported transaction on {}",
                    transaction.holding_ref
                );
            }
        }

        if fresh.is_empty() {
            return Ok(0);
        }
        self.transactions.insert_batch(fresh).await
    }
}
