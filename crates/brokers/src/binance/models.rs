//! Wire models for the exchange endpoints and the typed portfolio output.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Parse an exchange decimal string, treating garbage as zero.
pub(crate) fn decimal_or_zero(raw: &str) -> Decimal {
    raw.trim().parse().unwrap_or(Decimal::ZERO)
}

/// Response from the spot account endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    pub balances: Vec<SpotBalance>,
}

/// One spot asset row: free plus locked amounts, as decimal strings.
#[derive(Debug, Deserialize)]
pub(crate) struct SpotBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

impl SpotBalance {
    pub fn total(&self) -> Decimal {
        decimal_or_zero(&self.free) + decimal_or_zero(&self.locked)
    }
}

/// Response from the flexible simple-earn positions endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct FlexibleEarnResponse {
    #[serde(default)]
    pub rows: Vec<FlexibleEarnRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FlexibleEarnRow {
    pub asset: String,
    pub total_amount: String,
}

/// Response from the locked simple-earn positions endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct LockedEarnResponse {
    #[serde(default)]
    pub rows: Vec<LockedEarnRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LockedEarnRow {
    pub asset: String,
    pub amount: String,
}

/// One entry of the public ticker snapshot.
#[derive(Debug, Deserialize)]
pub(crate) struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

/// One fill from the trade-history endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TradeRecord {
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    /// Fill time in epoch milliseconds.
    pub time: i64,
    pub is_buyer: bool,
}

impl TradeRecord {
    pub fn into_trade(self) -> ExchangeTrade {
        let executed_at = Utc
            .timestamp_millis_opt(self.time)
            .single()
            .unwrap_or_else(Utc::now);
        ExchangeTrade {
            quantity: decimal_or_zero(&self.qty),
            price: decimal_or_zero(&self.price),
            amount: decimal_or_zero(&self.quote_qty),
            is_buy: self.is_buyer,
            executed_at,
        }
    }
}

/// One fill, typed for the cost-basis calculator and transaction import.
#[derive(Debug, Clone)]
pub struct ExchangeTrade {
    pub quantity: Decimal,
    pub price: Decimal,
    /// Quote-currency amount of the fill.
    pub amount: Decimal,
    pub is_buy: bool,
    pub executed_at: DateTime<Utc>,
}

/// One aggregated asset balance across spot and both earn tiers.
#[derive(Debug, Clone)]
pub struct ExchangeBalance {
    pub asset: String,
    /// Sum of all sub-account balances observed in the same fetch.
    pub total: Decimal,
    pub price_usd: Decimal,
    /// `total * price_usd`.
    pub value_usd: Decimal,
    /// Weighted-average acquisition cost, when trade history was fetched.
    pub cost_basis: Option<Decimal>,
    /// Trade history backing the cost basis; empty on scheduled syncs.
    pub trades: Vec<ExchangeTrade>,
}

/// The full portfolio snapshot returned by the client.
#[derive(Debug, Clone, Default)]
pub struct ExchangePortfolio {
    pub balances: Vec<ExchangeBalance>,
    pub total_value_usd: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_response_deserialization() {
        let json = r#"{
            "makerCommission": 10,
            "balances": [
                {"asset": "BTC", "free": "0.5", "locked": "0.1"},
                {"asset": "ETH", "free": "0", "locked": "0"}
            ]
        }"#;

        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.balances.len(), 2);
        assert_eq!(account.balances[0].total(), dec!(0.6));
        assert_eq!(account.balances[1].total(), Decimal::ZERO);
    }

    #[test]
    fn test_earn_rows_deserialization() {
        let flexible: FlexibleEarnResponse = serde_json::from_str(
            r#"{"total": 1, "rows": [{"asset": "BTC", "totalAmount": "0.25", "latestAnnualPercentageRate": "0.02"}]}"#,
        )
        .unwrap();
        assert_eq!(flexible.rows[0].asset, "BTC");
        assert_eq!(decimal_or_zero(&flexible.rows[0].total_amount), dec!(0.25));

        let locked: LockedEarnResponse = serde_json::from_str(
            r#"{"total": 1, "rows": [{"asset": "SOL", "amount": "12", "positionId": 1}]}"#,
        )
        .unwrap();
        assert_eq!(locked.rows[0].asset, "SOL");
        assert_eq!(decimal_or_zero(&locked.rows[0].amount), dec!(12));
    }

    #[test]
    fn test_empty_earn_response_defaults_to_no_rows() {
        let flexible: FlexibleEarnResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(flexible.rows.is_empty());
    }

    #[test]
    fn test_trade_record_conversion() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "id": 28457,
            "price": "40000.00",
            "qty": "0.05",
            "quoteQty": "2000.00",
            "time": 1700000000000,
            "isBuyer": true,
            "isMaker": false
        }"#;

        let record: TradeRecord = serde_json::from_str(json).unwrap();
        let trade = record.into_trade();
        assert_eq!(trade.quantity, dec!(0.05));
        assert_eq!(trade.price, dec!(40000.00));
        assert_eq!(trade.amount, dec!(2000.00));
        assert!(trade.is_buy);
        assert_eq!(trade.executed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_garbage_decimal_is_zero() {
        assert_eq!(decimal_or_zero("not-a-number"), Decimal::ZERO);
        assert_eq!(decimal_or_zero(" 1.5 "), dec!(1.5));
    }
}
