//! Error taxonomy for askfolio.
//!
//! Propagation policy: provider and format failures are recovered locally
//! wherever a degraded answer exists; only configuration and malformed-input
//! errors cross the system boundary as hard errors.

use thiserror::Error;

/// All errors produced by the askfolio crates.
#[derive(Debug, Error)]
pub enum AskfolioError {
    /// Missing credential or unusable configuration. Operator-fixable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Non-success HTTP response from an external provider.
    #[error("provider error {status}: {body}")]
    Provider { status: u16, body: String },

    /// Provider responded 2xx but the payload shape did not match.
    #[error("malformed provider response: {0}")]
    Format(String),

    /// Empty or missing question. Rejected before any network call.
    #[error("invalid input: {0}")]
    Input(String),

    /// Unsupported resume document. Partial-parse misses are NOT errors.
    #[error("resume parse error: {0}")]
    Parse(String),

    /// Transport-level failure (connect, timeout, body read).
    #[error("http error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AskfolioError {
    /// Whether a retry with backoff is warranted (rate limit or server error).
    pub fn is_retryable(&self) -> bool {
        match self {
            AskfolioError::Provider { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            AskfolioError::Http(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AskfolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        let too_many = AskfolioError::Provider { status: 429, body: String::new() };
        let server = AskfolioError::Provider { status: 503, body: String::new() };
        let client = AskfolioError::Provider { status: 400, body: String::new() };
        assert!(too_many.is_retryable());
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!AskfolioError::Config("x".into()).is_retryable());
    }
}
