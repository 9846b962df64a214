//! Error taxonomy for a single poll cycle

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error(
        "API endpoint has denied access. This might be due to geolocation limitations, \
         please try running from an Israeli-based IP or proxy."
    )]
    AccessDenied,

    #[error("Error parsing JSON: {0}")]
    Parse(String),

    #[error("Missing keys in JSON data: {0}")]
    Schema(String),
}

impl FeedError {
    /// Only an access denial stops the poll loop; everything else is retried
    /// on the next tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeedError::AccessDenied)
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FeedError::Timeout
        } else {
            FeedError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_access_denied_is_fatal() {
        assert!(FeedError::AccessDenied.is_fatal());
        assert!(!FeedError::Timeout.is_fatal());
        assert!(!FeedError::Transport("reset".into()).is_fatal());
        assert!(!FeedError::HttpStatus(500).is_fatal());
        assert!(!FeedError::Parse("eof".into()).is_fatal());
        assert!(!FeedError::Schema("id".into()).is_fatal());
    }
}
