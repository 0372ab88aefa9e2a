//! The report-polling client: request, poll, parse.

use std::time::Duration;

use log::{debug, info};

use super::models::FlexStatement;
use super::parser;
use super::protocol::{classify_poll_response, classify_request_response, PollOutcome, RequestOutcome};
use super::transport::{FlexTransport, HttpFlexTransport};
use super::BROKER_ID;
use crate::errors::BrokerError;

/// Polling behavior of the client.
#[derive(Debug, Clone)]
pub struct FlexConfig {
    /// Fixed wait between polls of the statement endpoint.
    pub poll_interval: Duration,
    /// Hard ceiling on poll attempts before failing closed.
    pub max_poll_attempts: u32,
}

impl Default for FlexConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 30,
        }
    }
}

/// Client for the asynchronous Flex statement protocol.
///
/// # Example
///
/// ```ignore
/// let client = FlexClient::new(FlexConfig::default());
/// let statement = client.fetch_statement(&token, &query_id).await?;
/// ```
pub struct FlexClient<T: FlexTransport> {
    transport: T,
    config: FlexConfig,
}

impl FlexClient<HttpFlexTransport> {
    pub fn new(config: FlexConfig) -> Self {
        Self::with_transport(HttpFlexTransport::new(), config)
    }
}

impl<T: FlexTransport> FlexClient<T> {
    pub fn with_transport(transport: T, config: FlexConfig) -> Self {
        Self { transport, config }
    }

    /// Run the full request, poll, parse cycle for one statement.
    ///
    /// The polling loop is inherently serial: it waits on one specific
    /// reference code and enforces the attempt ceiling rather than hanging
    /// on a statement that never generates.
    pub async fn fetch_statement(
        &self,
        token: &str,
        query_id: &str,
    ) -> Result<FlexStatement, BrokerError> {
        let reference_code = self.request_statement(token, query_id).await?;
        info!(
            "Flex statement request accepted, reference code {}",
            reference_code
        );

        let body = self.poll_statement(token, &reference_code).await?;
        parser::parse_statement(&body)
    }

    async fn request_statement(&self, token: &str, query_id: &str) -> Result<String, BrokerError> {
        let body = self.transport.send_request(token, query_id).await?;

        match classify_request_response(&body) {
            RequestOutcome::Accepted { reference_code } => Ok(reference_code),
            RequestOutcome::RateLimited => Err(BrokerError::RateLimited {
                broker: BROKER_ID.to_string(),
            }),
            RequestOutcome::Rejected { code, message } => Err(BrokerError::Protocol {
                broker: BROKER_ID.to_string(),
                endpoint: "SendRequest".to_string(),
                message: format!("{} (code {})", message, code),
            }),
            RequestOutcome::Unrecognized => Err(BrokerError::Protocol {
                broker: BROKER_ID.to_string(),
                endpoint: "SendRequest".to_string(),
                message: "Response carried neither a reference code nor an error".to_string(),
            }),
        }
    }

    async fn poll_statement(
        &self,
        token: &str,
        reference_code: &str,
    ) -> Result<String, BrokerError> {
        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            let body = self.transport.get_statement(token, reference_code).await?;
            match classify_poll_response(&body) {
                PollOutcome::Ready => {
                    info!("Flex statement ready after {} poll attempts", attempt);
                    return Ok(body);
                }
                PollOutcome::InProgress => {
                    debug!(
                        "Flex statement still generating (attempt {}/{})",
                        attempt, self.config.max_poll_attempts
                    );
                }
                PollOutcome::RateLimited => {
                    return Err(BrokerError::RateLimited {
                        broker: BROKER_ID.to_string(),
                    })
                }
                PollOutcome::Failed { code, message } => {
                    return Err(BrokerError::Protocol {
                        broker: BROKER_ID.to_string(),
                        endpoint: "GetStatement".to_string(),
                        message: format!("{} (code {})", message, code),
                    })
                }
            }
        }

        Err(BrokerError::Timeout {
            broker: BROKER_ID.to_string(),
            attempts: self.config.max_poll_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    const ACCEPT_BODY: &str =
        "<FlexStatementResponse><Status>Success</Status><ReferenceCode>42</ReferenceCode></FlexStatementResponse>";
    const IN_PROGRESS_BODY: &str = "<FlexStatementResponse><Status>Warn</Status>\
<ErrorCode>1019</ErrorCode><ErrorMessage>Statement generation in progress. Please try again shortly.</ErrorMessage></FlexStatementResponse>";
    const READY_BODY: &str = r#"<FlexQueryResponse queryName="holdings" type="AF">
<OpenPosition symbol="AAPL" conid="265598" position="1" markPrice="190" costBasisPrice="150" fifoPnlUnrealized="40" assetCategory="STK" currency="USD" />
<CashReportCurrency currency="USD" endingCash="10" />
</FlexQueryResponse>"#;

    struct ScriptedTransport {
        poll_body: &'static str,
        ready_after: Option<u32>,
        polls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(poll_body: &'static str, ready_after: Option<u32>) -> Self {
            Self {
                poll_body,
                ready_after,
                polls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl FlexTransport for ScriptedTransport {
        async fn send_request(&self, _token: &str, _query_id: &str) -> Result<String, BrokerError> {
            Ok(ACCEPT_BODY.to_string())
        }

        async fn get_statement(
            &self,
            _token: &str,
            _reference_code: &str,
        ) -> Result<String, BrokerError> {
            let attempt = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.ready_after {
                Some(n) if attempt >= n => Ok(READY_BODY.to_string()),
                _ => Ok(self.poll_body.to_string()),
            }
        }
    }

    fn fast_config() -> FlexConfig {
        FlexConfig {
            poll_interval: Duration::ZERO,
            ..FlexConfig::default()
        }
    }

    #[tokio::test]
    async fn test_statement_ready_after_a_few_polls() {
        let transport = ScriptedTransport::new(IN_PROGRESS_BODY, Some(3));
        let client = FlexClient::with_transport(transport, fast_config());

        let statement = client.fetch_statement("tok", "q1").await.unwrap();
        assert_eq!(statement.positions.len(), 1);
        assert_eq!(client.transport.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_always_in_progress_times_out_after_exactly_thirty_attempts() {
        let transport = ScriptedTransport::new(IN_PROGRESS_BODY, None);
        let client = FlexClient::with_transport(transport, fast_config());

        let error = client.fetch_statement("tok", "q1").await.unwrap_err();
        assert!(matches!(
            error,
            BrokerError::Timeout { attempts: 30, .. }
        ));
        assert_eq!(client.transport.polls.load(Ordering::SeqCst), 30);
    }

    #[tokio::test]
    async fn test_rate_limited_poll_aborts_immediately() {
        const THROTTLED_BODY: &str = "<FlexStatementResponse><ErrorCode>1018</ErrorCode>\
<ErrorMessage>Too many requests</ErrorMessage></FlexStatementResponse>";
        let transport = ScriptedTransport::new(THROTTLED_BODY, None);
        let client = FlexClient::with_transport(transport, fast_config());

        let error = client.fetch_statement("tok", "q1").await.unwrap_err();
        assert!(matches!(error, BrokerError::RateLimited { .. }));
        assert_eq!(client.transport.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_request_is_protocol_error_with_message() {
        struct RejectingTransport;

        #[async_trait]
        impl FlexTransport for RejectingTransport {
            async fn send_request(&self, _t: &str, _q: &str) -> Result<String, BrokerError> {
                Ok("<FlexStatementResponse><ErrorCode>1012</ErrorCode>\
<ErrorMessage>Token has expired.</ErrorMessage></FlexStatementResponse>"
                    .to_string())
            }
            async fn get_statement(&self, _t: &str, _r: &str) -> Result<String, BrokerError> {
                unreachable!("request never succeeds")
            }
        }

        let client = FlexClient::with_transport(RejectingTransport, fast_config());
        let error = client.fetch_statement("tok", "q1").await.unwrap_err();
        match error {
            BrokerError::Protocol { message, .. } => {
                assert!(message.contains("Token has expired."));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }
}
