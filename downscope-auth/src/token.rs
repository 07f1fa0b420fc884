//! Token artifacts produced by the flows

use crate::claims::{self, decode_claims};
use serde_json::{Map, Value};

/// Proof that one agent identity completed its own authentication handshake
/// through one client application.
#[derive(Debug, Clone)]
pub struct ActorToken {
    /// The token as issued by the provider
    pub raw: String,

    /// Unverified display claims (observability only)
    pub claims: Map<String, Value>,
}

impl ActorToken {
    /// Wrap a raw token, decoding display claims.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let claims = decode_claims(&raw);
        Self { raw, claims }
    }

    /// One-line human-readable claim summary.
    pub fn summary(&self) -> String {
        claims::display_summary(&self.claims)
    }
}

/// A downscoped token minted by token exchange from a subject and an actor
/// token. This is the only artifact that may be forwarded to a domain API.
#[derive(Debug, Clone)]
pub struct DelegatedToken {
    /// The token as issued by the provider
    pub raw: String,

    /// Scope actually granted by the provider.
    ///
    /// The provider is the scope authority: this may be narrower than what
    /// was requested and is never widened client-side.
    pub scope: Vec<String>,

    /// Unverified display claims (observability only)
    pub claims: Map<String, Value>,
}

impl DelegatedToken {
    /// Wrap a raw token plus the scope string the provider reported.
    ///
    /// Falls back to the token's own `scope` claim when the response body
    /// did not carry one.
    pub fn new(raw: impl Into<String>, response_scope: Option<&str>) -> Self {
        let raw = raw.into();
        let claims = decode_claims(&raw);
        let scope_str = response_scope
            .map(str::to_string)
            .or_else(|| claims.get("scope").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        let scope = scope_str.split_whitespace().map(str::to_string).collect();

        Self { raw, scope, claims }
    }

    /// One-line human-readable claim summary.
    pub fn summary(&self) -> String {
        claims::display_summary(&self.claims)
    }
}
