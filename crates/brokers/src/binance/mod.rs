//! Signed REST client for the exchange API.
//!
//! Aggregates a portfolio snapshot across several endpoints:
//! spot account balances, two simple-earn tiers (flexible and locked),
//! a public price ticker, and (optionally) per-asset trade history for
//! cost basis. Authenticated calls carry a millisecond timestamp and an
//! HMAC-SHA256 signature over the query string; the API key travels in a
//! request header, never in the URL.

mod client;
mod models;
mod signing;

pub use client::{BinanceClient, BinanceConfig, FetchOptions};
pub use models::{ExchangeBalance, ExchangePortfolio, ExchangeTrade};

/// Broker identifier used in errors and stored entities.
pub const BROKER_ID: &str = "BINANCE";

/// Currency-pegged stable assets: priced at a fixed 1 instead of a ticker
/// lookup, and promoted to cash balances by the reconciliation layer.
pub const STABLE_ASSETS: [&str; 5] = ["USDT", "USDC", "FDUSD", "TUSD", "DAI"];

/// True when the asset is a currency-pegged stable token.
pub fn is_stable_asset(asset: &str) -> bool {
    STABLE_ASSETS.contains(&asset)
}
