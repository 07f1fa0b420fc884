//! Identity-provider endpoint configuration
//!
//! The provider is a black-box OAuth2 server exposing the three endpoints
//! the flows consume: authorize, authn, and token.

use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-request timeout toward the provider
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authenticator id for the provider's username/password authenticator
pub const DEFAULT_BASIC_AUTHENTICATOR_ID: &str = "QmFzaWNBdXRoZW50aWNhdG9yOkxPQ0FM";

/// Connection settings for one identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider base URL, e.g. `https://localhost:9443`
    pub base_url: String,

    /// Redirect target registered with the client applications.
    ///
    /// Never actually followed (`response_mode=direct`), but must match the
    /// registration and be repeated verbatim at code redemption.
    pub redirect_uri: String,

    /// Id of the username/password authenticator to select in step 2
    pub authenticator_id: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Skip TLS certificate validation. Only for local dev providers.
    pub accept_invalid_certs: bool,
}

impl ProviderConfig {
    /// Create a config with default authenticator and timeout.
    pub fn new(base_url: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            redirect_uri: redirect_uri.into(),
            authenticator_id: DEFAULT_BASIC_AUTHENTICATOR_ID.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
        }
    }

    /// Allow invalid TLS certificates (local development only).
    pub fn with_insecure_tls(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Authorization initiation endpoint
    pub fn authorize_url(&self) -> String {
        format!("{}/oauth2/authorize", self.base_url.trim_end_matches('/'))
    }

    /// Authentication-step endpoint
    pub fn authn_url(&self) -> String {
        format!("{}/oauth2/authn", self.base_url.trim_end_matches('/'))
    }

    /// Token issuance / exchange endpoint
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.base_url.trim_end_matches('/'))
    }

    /// Build an isolated HTTP client for a single flow invocation.
    ///
    /// No cookie store: the provider may short-circuit the handshake based
    /// on an existing session, so session state must never be shared
    /// between flows for different agents.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {}", e)))
    }
}
