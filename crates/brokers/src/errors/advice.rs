//! User-facing classification of broker failures.

/// How a broker failure should be presented by the layer that owns the
/// user interaction.
///
/// The sync engine itself never retries inside a call; this classification
/// only drives the message shown (or logged) for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAdvice {
    /// Credentials or signature were rejected; the user must reconfigure
    /// the stored credentials before another attempt can succeed.
    ReconfigureCredentials,

    /// The broker throttled us; trying again later (or waiting for the
    /// next scheduled run) is expected to succeed.
    TryAgainLater,

    /// The report did not become ready in time; large accounts may need
    /// more time, so trying again is reasonable.
    TryAgainLonger,

    /// Unexpected response from the broker; surface the broker's own
    /// message verbatim.
    ShowBrokerMessage,
}

impl FailureAdvice {
    /// Short user-facing hint for this advice class.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::ReconfigureCredentials => "Please reconfigure your broker credentials.",
            Self::TryAgainLater => "The broker is rate limiting requests. Try again later.",
            Self::TryAgainLonger => {
                "The report was not ready in time. Large accounts may need more time; try again."
            }
            Self::ShowBrokerMessage => "The broker returned an unexpected response.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_are_distinct() {
        let hints = [
            FailureAdvice::ReconfigureCredentials.hint(),
            FailureAdvice::TryAgainLater.hint(),
            FailureAdvice::TryAgainLonger.hint(),
            FailureAdvice::ShowBrokerMessage.hint(),
        ];
        for (i, a) in hints.iter().enumerate() {
            for b in hints.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
