//! Traits defining the contract between the orchestrator and the broker
//! protocol clients.
//!
//! The orchestrator only needs the fetch boundary of each client; the
//! traits keep it testable against scripted fakes and independent of the
//! transport details in `finfolio-brokers`.

use async_trait::async_trait;

use finfolio_brokers::binance::{ExchangePortfolio, FetchOptions};
use finfolio_brokers::flex::FlexStatement;
use finfolio_brokers::BrokerError;

/// Fetches a parsed statement from the brokerage Flex service.
#[async_trait]
pub trait BrokerageStatementClient: Send + Sync {
    async fn fetch_statement(
        &self,
        token: &str,
        query_id: &str,
    ) -> Result<FlexStatement, BrokerError>;
}

/// Fetches the aggregated portfolio snapshot from the exchange.
#[async_trait]
pub trait ExchangePortfolioClient: Send + Sync {
    async fn fetch_portfolio(
        &self,
        api_key: &str,
        api_secret: &str,
        options: FetchOptions,
    ) -> Result<ExchangePortfolio, BrokerError>;
}
