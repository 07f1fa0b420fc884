//! Environment-driven configuration
//!
//! Loads the provider endpoints, both client applications, the orchestrator
//! agent, and the worker agent roster from environment variables (with
//! `.env` support). Workers are declared by name in `WORKER_AGENTS`; each
//! name expands to `{NAME}_AGENT_ID` / `{NAME}_AGENT_SECRET` /
//! `{NAME}_AGENT_SCOPES` / `{NAME}_AGENT_AUDIENCE` lookups. A worker with
//! missing credentials is skipped with a warning rather than failing the
//! whole run.

use downscope_auth::{AgentIdentity, AuthError, ClientApplication, ProviderConfig, Result};
use std::env;
use tracing::warn;

/// Default worker roster when `WORKER_AGENTS` is unset
const DEFAULT_WORKERS: &str = "hr,it,approval,booking";

/// Default audience for delegated tokens
const DEFAULT_AUDIENCE: &str = "onboarding-api";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity-provider connection settings
    pub provider: ProviderConfig,

    /// Application fronting the orchestrator's own handshake
    pub orchestrator_app: ClientApplication,

    /// Application fronting worker handshakes and token exchanges
    pub token_exchanger_app: ClientApplication,

    /// The orchestrating agent identity
    pub orchestrator: AgentIdentity,

    /// Worker agents, in declaration order
    pub workers: Vec<AgentIdentity>,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let base_url =
            env::var("IDP_BASE_URL").unwrap_or_else(|_| "https://localhost:9443".to_string());
        let redirect_uri = env::var("APP_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:8000/callback".to_string());

        let mut provider = ProviderConfig::new(base_url, redirect_uri);
        if let Ok(id) = env::var("IDP_AUTHENTICATOR_ID") {
            provider.authenticator_id = id;
        }
        if let Ok(secs) = env::var("IDP_TIMEOUT_SECS") {
            provider.timeout_secs = secs
                .parse()
                .map_err(|_| AuthError::Config(format!("Invalid IDP_TIMEOUT_SECS: {secs}")))?;
        }
        provider.accept_invalid_certs = env_flag("IDP_INSECURE_TLS");

        let orchestrator_app = ClientApplication::new(
            required("ORCHESTRATOR_CLIENT_ID")?,
            required("ORCHESTRATOR_CLIENT_SECRET")?,
        )?;
        let token_exchanger_app = ClientApplication::new(
            required("TOKEN_EXCHANGER_CLIENT_ID")?,
            required("TOKEN_EXCHANGER_CLIENT_SECRET")?,
        )?;

        let orchestrator = AgentIdentity::new(
            required("ORCHESTRATOR_AGENT_ID")?,
            required("ORCHESTRATOR_AGENT_SECRET")?,
            Vec::new(), // handshake defaults to openid
            DEFAULT_AUDIENCE,
        )?;

        let roster = env::var("WORKER_AGENTS").unwrap_or_else(|_| DEFAULT_WORKERS.to_string());
        let mut workers = Vec::new();
        for name in roster.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match worker_from_env(name)? {
                Some(worker) => workers.push(worker),
                None => warn!(worker = name, "missing agent credentials; skipping"),
            }
        }

        Ok(Self {
            provider,
            orchestrator_app,
            token_exchanger_app,
            orchestrator,
            workers,
        })
    }

    /// Look up a configured worker by roster name or agent id.
    pub fn find_worker(&self, name: &str) -> Option<&AgentIdentity> {
        self.workers
            .iter()
            .find(|w| w.agent_id == name || w.agent_id.starts_with(name))
    }
}

/// Resolve one roster entry. `Ok(None)` means the worker is declared but has
/// no credentials provisioned.
fn worker_from_env(name: &str) -> Result<Option<AgentIdentity>> {
    let prefix = name.to_uppercase().replace('-', "_");

    let agent_id = env::var(format!("{prefix}_AGENT_ID")).ok();
    let agent_secret = env::var(format!("{prefix}_AGENT_SECRET")).ok();
    let (agent_id, agent_secret) = match (agent_id, agent_secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => (id, secret),
        _ => return Ok(None),
    };

    let scopes = env::var(format!("{prefix}_AGENT_SCOPES"))
        .unwrap_or_else(|_| format!("{name}:read {name}:write"))
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let audience = env::var(format!("{prefix}_AGENT_AUDIENCE"))
        .unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string());

    AgentIdentity::new(agent_id, agent_secret, scopes, audience).map(Some)
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AuthError::Config(format!("{key} must be set")))
}

fn env_flag(key: &str) -> bool {
    matches!(
        env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
