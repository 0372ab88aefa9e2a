//! Pure classification of Flex service responses.
//!
//! The request and poll phases are modeled as explicit outcome enums plus
//! one transition function per received response body. The polling loop in
//! the client only matches on [`PollOutcome`], which keeps the attempt
//! bound and every terminal condition testable without a transport.

use lazy_static::lazy_static;
use regex::Regex;

/// Error code the service returns when the token is throttled.
const ERROR_CODE_RATE_LIMITED: &str = "1018";
/// Error code the service returns while the statement is still generating.
const ERROR_CODE_IN_PROGRESS: &str = "1019";
/// Root marker of a ready, generated report.
const READY_ROOT_MARKER: &str = "<FlexQueryResponse";
/// Legacy in-progress marker; some gateway versions omit the error code.
const IN_PROGRESS_TEXT: &str = "generation in progress";

lazy_static! {
    static ref REFERENCE_CODE_RE: Regex =
        Regex::new(r"<ReferenceCode>\s*([^<\s]+)\s*</ReferenceCode>").unwrap();
    static ref ERROR_CODE_RE: Regex = Regex::new(r"<ErrorCode>\s*(\d+)\s*</ErrorCode>").unwrap();
    static ref ERROR_MESSAGE_RE: Regex =
        Regex::new(r"<ErrorMessage>\s*([^<]*?)\s*</ErrorMessage>").unwrap();
}

/// Outcome of the initial statement-generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The service accepted the request and handed back a reference code.
    Accepted { reference_code: String },
    /// The token is throttled; the caller must not retry within this call.
    RateLimited,
    /// The service rejected the request with an error document.
    Rejected { code: String, message: String },
    /// Neither a reference code nor a recognizable error was present.
    Unrecognized,
}

/// Outcome of one poll of the statement endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The generated report is in the body; ready to parse.
    Ready,
    /// Still generating; poll again after the interval.
    InProgress,
    /// The token is throttled; abort the sync.
    RateLimited,
    /// Any other error document; abort with the service's message.
    Failed { code: String, message: String },
}

fn error_code(body: &str) -> Option<String> {
    ERROR_CODE_RE
        .captures(body)
        .map(|caps| caps[1].to_string())
}

fn error_message(body: &str) -> String {
    ERROR_MESSAGE_RE
        .captures(body)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "no error message in response".to_string())
}

/// Classify the body returned by the `SendRequest` endpoint.
pub fn classify_request_response(body: &str) -> RequestOutcome {
    if let Some(caps) = REFERENCE_CODE_RE.captures(body) {
        return RequestOutcome::Accepted {
            reference_code: caps[1].to_string(),
        };
    }

    match error_code(body) {
        Some(code) if code == ERROR_CODE_RATE_LIMITED => RequestOutcome::RateLimited,
        Some(code) => RequestOutcome::Rejected {
            code,
            message: error_message(body),
        },
        None => RequestOutcome::Unrecognized,
    }
}

/// Classify the body returned by the `GetStatement` endpoint.
pub fn classify_poll_response(body: &str) -> PollOutcome {
    if body.contains(READY_ROOT_MARKER) {
        return PollOutcome::Ready;
    }

    match error_code(body) {
        Some(code) if code == ERROR_CODE_RATE_LIMITED => PollOutcome::RateLimited,
        Some(code) if code == ERROR_CODE_IN_PROGRESS => PollOutcome::InProgress,
        Some(code) => PollOutcome::Failed {
            code,
            message: error_message(body),
        },
        None => {
            if body.to_lowercase().contains(IN_PROGRESS_TEXT) {
                PollOutcome::InProgress
            } else {
                PollOutcome::Failed {
                    code: String::new(),
                    message: error_message(body),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEPTED: &str = r#"<FlexStatementResponse timestamp="07 August, 2026 02:11 PM EDT">
<Status>Success</Status>
<ReferenceCode>9876543210</ReferenceCode>
<Url>https://gdcdyn.interactivebrokers.com/Universal/servlet/FlexStatementService.GetStatement</Url>
</FlexStatementResponse>"#;

    const THROTTLED: &str = r#"<FlexStatementResponse timestamp="07 August, 2026 02:11 PM EDT">
<Status>Warn</Status>
<ErrorCode>1018</ErrorCode>
<ErrorMessage>Too many requests have been made from this token. Please try again shortly.</ErrorMessage>
</FlexStatementResponse>"#;

    const EXPIRED: &str = r#"<FlexStatementResponse timestamp="07 August, 2026 02:11 PM EDT">
<Status>Fail</Status>
<ErrorCode>1012</ErrorCode>
<ErrorMessage>Token has expired.</ErrorMessage>
</FlexStatementResponse>"#;

    const GENERATING: &str = r#"<FlexStatementResponse timestamp="07 August, 2026 02:12 PM EDT">
<Status>Warn</Status>
<ErrorCode>1019</ErrorCode>
<ErrorMessage>Statement generation in progress. Please try again shortly.</ErrorMessage>
</FlexStatementResponse>"#;

    #[test]
    fn test_request_accepted_extracts_reference_code() {
        assert_eq!(
            classify_request_response(ACCEPTED),
            RequestOutcome::Accepted {
                reference_code: "9876543210".to_string()
            }
        );
    }

    #[test]
    fn test_request_rate_limited() {
        assert_eq!(classify_request_response(THROTTLED), RequestOutcome::RateLimited);
    }

    #[test]
    fn test_request_rejected_carries_service_message() {
        assert_eq!(
            classify_request_response(EXPIRED),
            RequestOutcome::Rejected {
                code: "1012".to_string(),
                message: "Token has expired.".to_string()
            }
        );
    }

    #[test]
    fn test_request_unrecognized_body() {
        assert_eq!(
            classify_request_response("<html>Service Unavailable</html>"),
            RequestOutcome::Unrecognized
        );
    }

    #[test]
    fn test_poll_ready_on_report_root_marker() {
        let body = r#"<FlexQueryResponse queryName="holdings" type="AF"></FlexQueryResponse>"#;
        assert_eq!(classify_poll_response(body), PollOutcome::Ready);
    }

    #[test]
    fn test_poll_in_progress_by_code() {
        assert_eq!(classify_poll_response(GENERATING), PollOutcome::InProgress);
    }

    #[test]
    fn test_poll_in_progress_by_legacy_text() {
        let body = "<FlexStatementResponse><Status>Warn</Status>\
<ErrorMessage>Statement generation in progress</ErrorMessage></FlexStatementResponse>";
        assert_eq!(classify_poll_response(body), PollOutcome::InProgress);
    }

    #[test]
    fn test_poll_rate_limited() {
        assert_eq!(classify_poll_response(THROTTLED), PollOutcome::RateLimited);
    }

    #[test]
    fn test_poll_other_error_is_failure() {
        let outcome = classify_poll_response(EXPIRED);
        assert_eq!(
            outcome,
            PollOutcome::Failed {
                code: "1012".to_string(),
                message: "Token has expired.".to_string()
            }
        );
    }
}
