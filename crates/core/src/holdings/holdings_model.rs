//! Holding, cash, position and transaction domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One asset held at an external source.
///
/// Identity key for upsert is `(user_id, source, external_id)`. Quantity
/// is the sum of all sub-account balances observed in the same sync pass;
/// a sync replaces it, never accumulates across passes. The sync engine
/// never deletes holdings; only a manual user action removes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub user_id: String,
    /// Broker identifier, e.g. "BINANCE".
    pub source: String,
    /// The source's stable id for the asset (exchange: the asset code).
    pub external_id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub asset_class: String,
    pub quantity: Decimal,
    /// Average acquisition cost per unit; absent when unknown.
    pub cost_basis: Option<Decimal>,
    pub current_price: Decimal,
    pub currency: String,
    pub last_price_update: DateTime<Utc>,
}

impl Holding {
    /// Natural reference for rows that point at this holding.
    pub fn ref_key(&self) -> String {
        holding_ref(&self.source, &self.external_id)
    }

    /// Current market value of the holding.
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }

    /// Additive update: fold extra units into the holding.
    ///
    /// This is the one path that adds instead of replacing quantity, used
    /// when the user appends units to an existing holding by hand. The
    /// cost basis becomes the blend of both parcels.
    pub fn absorb_additional(&mut self, quantity: Decimal, unit_cost: Option<Decimal>) {
        let previous_quantity = self.quantity;
        self.quantity += quantity;

        if self.quantity.is_zero() {
            return;
        }

        self.cost_basis = match (self.cost_basis, unit_cost) {
            (Some(existing), Some(added)) => {
                Some((existing * previous_quantity + added * quantity) / self.quantity)
            }
            (None, Some(added)) => Some(added),
            (basis, None) => basis,
        };
    }
}

/// Natural reference to a holding, shared by transactions.
pub fn holding_ref(source: &str, external_id: &str) -> String {
    format!("{}:{}", source, external_id)
}

/// Cash at an external source, one row per currency.
///
/// Derived for currency-pegged stable tokens above the materiality
/// threshold, and for the brokerage cash report. Identity key is
/// `(user_id, source, currency)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalance {
    pub user_id: String,
    pub source: String,
    pub currency: String,
    pub amount: Decimal,
    pub last_sync_at: DateTime<Utc>,
}

/// One brokerage position.
///
/// Identity key is `(user_id, external_security_id)`. Zero-quantity
/// positions are skipped entirely: not stored, not deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub user_id: String,
    pub symbol: String,
    pub external_security_id: String,
    pub isin: Option<String>,
    pub quantity: Decimal,
    pub current_price: Decimal,
    pub cost_basis_price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: Option<Decimal>,
    pub asset_category: String,
    pub currency: String,
    pub exchange: Option<String>,
    pub last_sync_at: DateTime<Utc>,
}

/// Buy or sell side of an imported transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
}

/// One imported trade against a holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub user_id: String,
    /// Natural reference to the holding, `source:external_id`.
    pub holding_ref: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Quote-currency amount of the trade.
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub source_note: Option<String>,
}

impl Transaction {
    pub fn dedupe_key(&self) -> TransactionKey {
        TransactionKey {
            holding_ref: self.holding_ref.clone(),
            transaction_date: self.transaction_date,
            amount: self.amount,
        }
    }
}

/// Natural dedupe key for imported transactions.
///
/// A transaction matching an existing key on a repeat sync is treated as
/// already imported and skipped, never re-inserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionKey {
    pub holding_ref: String,
    pub transaction_date: DateTime<Utc>,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(quantity: Decimal, cost_basis: Option<Decimal>) -> Holding {
        Holding {
            user_id: "user-1".to_string(),
            source: "BINANCE".to_string(),
            external_id: "BTC".to_string(),
            symbol: "BTC".to_string(),
            name: None,
            asset_class: "CRYPTO".to_string(),
            quantity,
            cost_basis,
            current_price: dec!(40000),
            currency: "USD".to_string(),
            last_price_update: Utc::now(),
        }
    }

    #[test]
    fn test_ref_key_shape() {
        assert_eq!(holding(dec!(1), None).ref_key(), "BINANCE:BTC");
    }

    #[test]
    fn test_market_value() {
        assert_eq!(holding(dec!(0.5), None).market_value(), dec!(20000));
    }

    #[test]
    fn test_absorb_additional_blends_cost_basis() {
        let mut holding = holding(dec!(10), Some(dec!(100)));
        holding.absorb_additional(dec!(10), Some(dec!(200)));

        assert_eq!(holding.quantity, dec!(20));
        assert_eq!(holding.cost_basis, Some(dec!(150)));
    }

    #[test]
    fn test_absorb_additional_without_new_cost_keeps_old_basis() {
        let mut holding = holding(dec!(10), Some(dec!(100)));
        holding.absorb_additional(dec!(5), None);

        assert_eq!(holding.quantity, dec!(15));
        assert_eq!(holding.cost_basis, Some(dec!(100)));
    }

    #[test]
    fn test_absorb_additional_adopts_cost_when_none_existed() {
        let mut holding = holding(dec!(3), None);
        holding.absorb_additional(dec!(1), Some(dec!(50)));

        assert_eq!(holding.quantity, dec!(4));
        assert_eq!(holding.cost_basis, Some(dec!(50)));
    }

    #[test]
    fn test_transaction_dedupe_key_ignores_mutable_fields() {
        let date = Utc::now();
        let transaction = Transaction {
            user_id: "user-1".to_string(),
            holding_ref: "BINANCE:BTC".to_string(),
            kind: TransactionKind::Buy,
            quantity: dec!(0.1),
            price: dec!(40000),
            amount: dec!(4000),
            transaction_date: date,
            source_note: Some("exchange import".to_string()),
        };

        let mut other = transaction.clone();
        other.kind = TransactionKind::Sell;
        other.source_note = None;

        assert_eq!(transaction.dedupe_key(), other.dedupe_key());
    }
}
