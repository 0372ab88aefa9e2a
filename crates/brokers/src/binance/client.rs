//! The signed REST client: balance aggregation, pricing, cost basis.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

use super::models::{
    decimal_or_zero, AccountResponse, ExchangeBalance, ExchangePortfolio, ExchangeTrade,
    FlexibleEarnResponse, LockedEarnResponse, TickerPrice, TradeRecord,
};
use super::{is_stable_asset, signing, BROKER_ID};
use crate::cost_basis::{CostBasisTracker, TradeFill};
use crate::errors::BrokerError;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const ACCOUNT_PATH: &str = "/api/v3/account";
const FLEXIBLE_EARN_PATH: &str = "/sapi/v1/simple-earn/flexible/position";
const LOCKED_EARN_PATH: &str = "/sapi/v1/simple-earn/locked/position";
const TICKER_PATH: &str = "/api/v3/ticker/price";
const TRADES_PATH: &str = "/api/v3/myTrades";

/// Quote currency all assets are priced against.
const REFERENCE_STABLE: &str = "USDT";

/// Page size requested from the earn endpoints.
const EARN_PAGE_SIZE: &str = "100";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client behavior knobs.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    /// Fixed pause between per-asset trade-history fetches.
    pub trade_fetch_delay: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            trade_fetch_delay: Duration::from_millis(250),
        }
    }
}

/// Per-call fetch options.
///
/// `include_cost_basis` drives the trade-history pass: the on-demand sync
/// sets it, the scheduled sync does not. The asymmetry keeps scheduled
/// batches fast and inside the exchange's rate budget; it is a deliberate
/// flag rather than two divergent code paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub include_cost_basis: bool,
}

/// Client for the exchange's signed REST API.
///
/// # Example
///
/// ```ignore
/// let client = BinanceClient::new(BinanceConfig::default());
/// let portfolio = client
///     .fetch_portfolio(&api_key, &api_secret, FetchOptions { include_cost_basis: true })
///     .await?;
/// ```
pub struct BinanceClient {
    client: Client,
    config: BinanceConfig,
}

impl BinanceClient {
    pub fn new(config: BinanceConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// Fetch the aggregated portfolio snapshot.
    ///
    /// Spot balances and the price ticker are required; the two earn tiers
    /// are optional contributions that are skipped on failure. Quantities
    /// for one asset are summed across all sub-accounts of this single
    /// fetch, never across fetches.
    pub async fn fetch_portfolio(
        &self,
        api_key: &str,
        api_secret: &str,
        options: FetchOptions,
    ) -> Result<ExchangePortfolio, BrokerError> {
        let account = self.fetch_spot_account(api_key, api_secret).await?;

        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for balance in &account.balances {
            let total = balance.total();
            if total > Decimal::ZERO {
                *totals.entry(balance.asset.clone()).or_default() += total;
            }
        }
        debug!("Spot account holds {} nonzero assets", totals.len());

        for (asset, amount) in self.fetch_flexible_earn(api_key, api_secret).await {
            *totals.entry(asset).or_default() += amount;
        }
        for (asset, amount) in self.fetch_locked_earn(api_key, api_secret).await {
            *totals.entry(asset).or_default() += amount;
        }

        let prices = self.fetch_prices().await?;

        let mut balances = Vec::with_capacity(totals.len());
        let mut total_value_usd = Decimal::ZERO;

        for (asset, total) in totals {
            let price_usd = if is_stable_asset(&asset) {
                Decimal::ONE
            } else {
                let symbol = format!("{}{}", asset, REFERENCE_STABLE);
                match prices.get(&symbol) {
                    Some(price) => *price,
                    None => {
                        warn!("No ticker price for {}, valuing at zero", symbol);
                        Decimal::ZERO
                    }
                }
            };

            let mut trades: Vec<ExchangeTrade> = Vec::new();
            let mut cost_basis = None;
            if options.include_cost_basis && !is_stable_asset(&asset) && total > Decimal::ZERO {
                match self.fetch_trades(&asset, api_key, api_secret).await {
                    Ok(fetched) => {
                        if fetched.is_empty() {
                            debug!("No trade history for {}", asset);
                        } else {
                            let mut tracker = CostBasisTracker::new();
                            for trade in &fetched {
                                tracker.apply(&TradeFill {
                                    quantity: trade.quantity,
                                    price: trade.price,
                                    is_buy: trade.is_buy,
                                });
                            }
                            cost_basis = tracker.average_cost();
                            trades = fetched;
                        }
                    }
                    Err(error) => {
                        warn!("Skipping cost basis for {}: {}", asset, error);
                    }
                }
                tokio::time::sleep(self.config.trade_fetch_delay).await;
            }

            let value_usd = total * price_usd;
            total_value_usd += value_usd;
            balances.push(ExchangeBalance {
                asset,
                total,
                price_usd,
                value_usd,
                cost_basis,
                trades,
            });
        }

        info!(
            "Fetched exchange portfolio: {} assets, total value {} USD",
            balances.len(),
            total_value_usd.round_dp(2)
        );

        Ok(ExchangePortfolio {
            balances,
            total_value_usd,
        })
    }

    async fn signed_get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        api_key: &str,
        api_secret: &str,
    ) -> Result<reqwest::Response, BrokerError> {
        let timestamp = Utc::now().timestamp_millis();
        let query = signing::signed_query(params, timestamp, api_secret)?;
        let url = format!("{}{}?{}", self.config.base_url, path, query);

        Ok(self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", api_key)
            .send()
            .await?)
    }

    /// Classify a required endpoint's response; non-2xx is fatal here.
    async fn require_success(
        &self,
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<reqwest::Response, BrokerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(BrokerError::RateLimited {
                broker: BROKER_ID.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BrokerError::Authentication {
                broker: BROKER_ID.to_string(),
                message: body,
            }),
            _ => Err(BrokerError::Protocol {
                broker: BROKER_ID.to_string(),
                endpoint: endpoint.to_string(),
                message: format!("HTTP {}: {}", status, body),
            }),
        }
    }

    async fn fetch_spot_account(
        &self,
        api_key: &str,
        api_secret: &str,
    ) -> Result<AccountResponse, BrokerError> {
        let response = self
            .signed_get(ACCOUNT_PATH, &[], api_key, api_secret)
            .await?;
        let response = self.require_success(response, ACCOUNT_PATH).await?;
        Ok(response.json().await?)
    }

    /// Flexible-earn contributions; any failure only skips this tier.
    async fn fetch_flexible_earn(&self, api_key: &str, api_secret: &str) -> Vec<(String, Decimal)> {
        let result = self
            .signed_get(FLEXIBLE_EARN_PATH, &[("size", EARN_PAGE_SIZE)], api_key, api_secret)
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<FlexibleEarnResponse>().await {
                    Ok(parsed) => parsed
                        .rows
                        .into_iter()
                        .map(|row| (row.asset, decimal_or_zero(&row.total_amount)))
                        .collect(),
                    Err(error) => {
                        warn!("Skipping flexible earn balances: {}", error);
                        Vec::new()
                    }
                }
            }
            Ok(response) => {
                log_optional_unavailable(FLEXIBLE_EARN_PATH, response.status());
                Vec::new()
            }
            Err(error) => {
                warn!("Skipping flexible earn balances: {}", error);
                Vec::new()
            }
        }
    }

    /// Locked-earn contributions; any failure only skips this tier.
    async fn fetch_locked_earn(&self, api_key: &str, api_secret: &str) -> Vec<(String, Decimal)> {
        let result = self
            .signed_get(LOCKED_EARN_PATH, &[("size", EARN_PAGE_SIZE)], api_key, api_secret)
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<LockedEarnResponse>().await {
                    Ok(parsed) => parsed
                        .rows
                        .into_iter()
                        .map(|row| (row.asset, decimal_or_zero(&row.amount)))
                        .collect(),
                    Err(error) => {
                        warn!("Skipping locked earn balances: {}", error);
                        Vec::new()
                    }
                }
            }
            Ok(response) => {
                log_optional_unavailable(LOCKED_EARN_PATH, response.status());
                Vec::new()
            }
            Err(error) => {
                warn!("Skipping locked earn balances: {}", error);
                Vec::new()
            }
        }
    }

    /// Public ticker snapshot, keyed by trading pair symbol.
    async fn fetch_prices(&self) -> Result<HashMap<String, Decimal>, BrokerError> {
        let url = format!("{}{}", self.config.base_url, TICKER_PATH);
        let response = self.client.get(&url).send().await?;
        let response = self.require_success(response, TICKER_PATH).await?;

        let tickers: Vec<TickerPrice> = response.json().await?;
        Ok(tickers
            .into_iter()
            .map(|ticker| (ticker.symbol, decimal_or_zero(&ticker.price)))
            .collect())
    }

    /// Trade history for one asset against the reference stable currency.
    ///
    /// 400/404 mean the pair has no market for this account; that is
    /// "no trades", not an error.
    async fn fetch_trades(
        &self,
        asset: &str,
        api_key: &str,
        api_secret: &str,
    ) -> Result<Vec<ExchangeTrade>, BrokerError> {
        let symbol = format!("{}{}", asset, REFERENCE_STABLE);
        let response = self
            .signed_get(TRADES_PATH, &[("symbol", &symbol)], api_key, api_secret)
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            log_optional_unavailable(TRADES_PATH, status);
            return Ok(Vec::new());
        }
        let response = self.require_success(response, TRADES_PATH).await?;

        let records: Vec<TradeRecord> = response.json().await?;
        Ok(records.into_iter().map(TradeRecord::into_trade).collect())
    }
}

fn log_optional_unavailable(endpoint: &str, status: StatusCode) {
    debug!("Optional endpoint {} unavailable (HTTP {})", endpoint, status);
}
