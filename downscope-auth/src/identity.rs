//! Agent and client-application identities
//!
//! An [`AgentIdentity`] is a non-human principal with its own credentials;
//! a [`ClientApplication`] is the OAuth client fronting a given handshake.
//! The same agent can be authenticated through different applications
//! without re-provisioning its secret.

use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A non-human principal able to complete its own authentication handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AgentIdentity {
    /// Agent identifier, used as the authentication username
    #[validate(length(min = 1, max = 255))]
    pub agent_id: String,

    /// Agent secret, used as the authentication password
    #[validate(length(min = 1))]
    pub agent_secret: String,

    /// Scopes this agent is allowed to request at token-exchange time
    pub scopes: Vec<String>,

    /// Target API audience for the agent's delegated token
    #[validate(length(min = 1))]
    pub audience: String,
}

impl AgentIdentity {
    /// Create a validated agent identity.
    pub fn new(
        agent_id: impl Into<String>,
        agent_secret: impl Into<String>,
        scopes: Vec<String>,
        audience: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            agent_id: agent_id.into(),
            agent_secret: agent_secret.into(),
            scopes,
            audience: audience.into(),
        };

        identity
            .validate()
            .map_err(|e| AuthError::Config(format!("Invalid agent identity: {}", e)))?;

        Ok(identity)
    }

    /// Wire form of the agent's scope set: sorted, space-joined.
    ///
    /// Sorting makes the requested scope string deterministic so callers
    /// can assert exactly what was asked of the provider.
    pub fn scope_param(&self) -> String {
        join_scopes(&self.scopes)
    }
}

/// OAuth client application credentials fronting a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClientApplication {
    /// OAuth client identifier
    #[validate(length(min = 1, max = 255))]
    pub client_id: String,

    /// OAuth client secret, presented via HTTP basic auth
    #[validate(length(min = 1))]
    pub client_secret: String,
}

impl ClientApplication {
    /// Create a validated client application.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let app = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        };

        app.validate()
            .map_err(|e| AuthError::Config(format!("Invalid client application: {}", e)))?;

        Ok(app)
    }
}

/// Sort and space-join a scope set for the wire.
pub fn join_scopes(scopes: &[String]) -> String {
    let mut sorted: Vec<&str> = scopes.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}
