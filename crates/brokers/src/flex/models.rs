//! Typed output of a parsed Flex statement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One open position extracted from the report's position records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexPosition {
    pub symbol: String,
    /// The broker's stable numeric security id (conid).
    pub external_id: String,
    pub isin: Option<String>,
    /// Signed quantity; short positions are negative.
    pub quantity: Decimal,
    pub mark_price: Decimal,
    pub cost_basis_price: Decimal,
    /// `quantity * mark_price`.
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
    /// Derived from mark vs cost basis; absent when cost basis is zero.
    pub unrealized_pnl_percent: Option<Decimal>,
    pub asset_category: String,
    pub currency: String,
    pub exchange: Option<String>,
}

/// Ending cash per tracked currency, from the report's cash section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlexCashBalances {
    pub eur: Option<Decimal>,
    pub usd: Option<Decimal>,
}

impl FlexCashBalances {
    /// True when neither tracked currency produced a balance.
    pub fn is_empty(&self) -> bool {
        self.eur.is_none() && self.usd.is_none()
    }
}

/// The fully parsed statement: pure data, no storage concerns.
#[derive(Debug, Clone, Default)]
pub struct FlexStatement {
    pub positions: Vec<FlexPosition>,
    pub cash_balances: FlexCashBalances,
}
