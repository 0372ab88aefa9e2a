//! Transport seam for the Flex statement service.
//!
//! The two service endpoints are plain HTTP GETs with the token and the
//! query or reference code as query parameters. The trait exists so the
//! polling loop can be driven by a scripted fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::BROKER_ID;
use crate::errors::BrokerError;

const DEFAULT_BASE_URL: &str = "https://gdcdyn.interactivebrokers.com/Universal/servlet";
const SEND_REQUEST_PATH: &str = "/FlexStatementService.SendRequest";
const GET_STATEMENT_PATH: &str = "/FlexStatementService.GetStatement";
const PROTOCOL_VERSION: &str = "3";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw access to the two Flex service endpoints.
#[async_trait]
pub trait FlexTransport: Send + Sync {
    /// Submit a statement-generation request for the saved query.
    async fn send_request(&self, token: &str, query_id: &str) -> Result<String, BrokerError>;

    /// Fetch the generated statement (or an in-progress/error document).
    async fn get_statement(&self, token: &str, reference_code: &str)
        -> Result<String, BrokerError>;
}

/// Production transport over the gateway's HTTP endpoints.
pub struct HttpFlexTransport {
    client: Client,
    base_url: String,
}

impl HttpFlexTransport {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    async fn fetch(&self, path: &str, token: &str, query: &str) -> Result<String, BrokerError> {
        let url = format!(
            "{}{}?t={}&q={}&v={}",
            self.base_url,
            path,
            urlencoding::encode(token),
            urlencoding::encode(query),
            PROTOCOL_VERSION
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BrokerError::RateLimited {
                broker: BROKER_ID.to_string(),
            });
        }
        if !status.is_success() {
            return Err(BrokerError::Protocol {
                broker: BROKER_ID.to_string(),
                endpoint: path.to_string(),
                message: format!("HTTP error: {}", status),
            });
        }

        Ok(response.text().await?)
    }
}

impl Default for HttpFlexTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlexTransport for HttpFlexTransport {
    async fn send_request(&self, token: &str, query_id: &str) -> Result<String, BrokerError> {
        self.fetch(SEND_REQUEST_PATH, token, query_id).await
    }

    async fn get_statement(
        &self,
        token: &str,
        reference_code: &str,
    ) -> Result<String, BrokerError> {
        self.fetch(GET_STATEMENT_PATH, token, reference_code).await
    }
}
