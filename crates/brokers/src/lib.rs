//! Broker protocol clients for the portfolio synchronization engine.
//!
//! This crate is a pure fetch-and-parse boundary: it speaks the external
//! broker protocols and returns typed snapshots, but performs no storage.
//! It contains:
//! - [`flex`]: the asynchronous report-polling client for the brokerage
//!   Flex statement service (request, poll, parse).
//! - [`binance`]: the signed REST client for the exchange API (spot
//!   balances, earn tiers, prices, trade history).
//! - [`cost_basis`]: the weighted-average cost basis calculator fed by
//!   trade history.

pub mod binance;
pub mod cost_basis;
pub mod errors;
pub mod flex;

pub use errors::{BrokerError, FailureAdvice};
