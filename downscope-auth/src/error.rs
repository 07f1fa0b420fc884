//! Error types for delegated-token flows

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors raised while driving the handshake or token-exchange protocols
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Provider response was malformed or missing a required field
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Provider rejected the presented credentials or reported a failure status
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure (connect error, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Check if the error is worth retrying at the whole-flow level.
    ///
    /// Authorization codes are single-use, so retries must restart from
    /// step 1 of a flow rather than resume a partially consumed one.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::Protocol(format!("Unparseable provider response: {}", err))
        } else {
            AuthError::Network(err.to_string())
        }
    }
}
