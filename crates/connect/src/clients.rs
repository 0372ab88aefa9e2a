//! Adapters binding the concrete protocol clients to the orchestrator's
//! client traits.

use async_trait::async_trait;

use finfolio_brokers::binance::{BinanceClient, ExchangePortfolio, FetchOptions};
use finfolio_brokers::flex::{FlexClient, FlexStatement, FlexTransport};
use finfolio_brokers::BrokerError;

use crate::traits::{BrokerageStatementClient, ExchangePortfolioClient};

#[async_trait]
impl<T: FlexTransport> BrokerageStatementClient for FlexClient<T> {
    async fn fetch_statement(
        &self,
        token: &str,
        query_id: &str,
    ) -> Result<FlexStatement, BrokerError> {
        FlexClient::fetch_statement(self, token, query_id).await
    }
}

#[async_trait]
impl ExchangePortfolioClient for BinanceClient {
    async fn fetch_portfolio(
        &self,
        api_key: &str,
        api_secret: &str,
        options: FetchOptions,
    ) -> Result<ExchangePortfolio, BrokerError> {
        BinanceClient::fetch_portfolio(self, api_key, api_secret, options).await
    }
}
