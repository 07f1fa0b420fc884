//! Three-step actor-token handshake
//!
//! Drives authorize (direct response mode) -> authn -> token for one agent
//! identity fronted by one client application. Splitting the handshake into
//! three round-trips lets the provider verify the agent's own credentials as
//! a distinct authentication event, independent of which application fronts
//! the request; PKCE binds the initiating party to the code redemption.
//!
//! Single pass, no retries: authorization codes are single-use, so a failed
//! flow must be restarted from step 1 by the caller.

use crate::error::{AuthError, Result};
use crate::identity::{AgentIdentity, ClientApplication};
use crate::pkce::PkcePair;
use crate::provider::ProviderConfig;
use crate::token::ActorToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Terminal handshake status reported by the provider
const FLOW_STATUS_COMPLETED: &str = "SUCCESS_COMPLETED";

/// Scope requested in step 1 when an identity declares none of its own
const DEFAULT_HANDSHAKE_SCOPE: &str = "openid";

/// State after the authorization initiation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Provider requires an authentication event for this handshake
    AwaitingAuthn {
        /// Opaque handle correlating the steps of this handshake
        flow_id: String,
    },

    /// Provider short-circuited on an existing session and issued a code;
    /// step 2 is skipped entirely
    DirectCode {
        /// Single-use authorization code
        code: String,
    },
}

/// Response shape shared by the authorize and authn endpoints.
#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    #[serde(rename = "flowId")]
    flow_id: Option<String>,

    #[serde(rename = "flowStatus")]
    flow_status: Option<String>,

    code: Option<String>,

    #[serde(rename = "authData")]
    auth_data: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    code: Option<String>,
}

impl HandshakeResponse {
    /// The code may sit at the top level or nested under `authData`.
    fn code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .or_else(|| self.auth_data.as_ref().and_then(|d| d.code.as_deref()))
    }

    fn is_completed(&self) -> bool {
        self.flow_status.as_deref() == Some(FLOW_STATUS_COMPLETED)
    }
}

#[derive(Debug, Serialize)]
struct AuthnRequest<'a> {
    #[serde(rename = "flowId")]
    flow_id: &'a str,

    #[serde(rename = "selectedAuthenticator")]
    selected_authenticator: SelectedAuthenticator<'a>,
}

#[derive(Debug, Serialize)]
struct SelectedAuthenticator<'a> {
    #[serde(rename = "authenticatorId")]
    authenticator_id: &'a str,

    params: AuthnParams<'a>,
}

#[derive(Debug, Serialize)]
struct AuthnParams<'a> {
    username: &'a str,
    password: &'a str,
}

/// Token endpoint response (authorization-code and exchange grants).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: Option<String>,
    pub(crate) scope: Option<String>,
}

/// Run the complete three-step handshake for one agent identity.
///
/// Builds a fresh, isolated HTTP client for the invocation so that no
/// session state can leak between flows for different agents.
pub async fn get_actor_token(
    provider: &ProviderConfig,
    identity: &AgentIdentity,
    app: &ClientApplication,
) -> Result<ActorToken> {
    let client = provider.build_client()?;
    let pkce = PkcePair::generate();
    let scope = if identity.scopes.is_empty() {
        DEFAULT_HANDSHAKE_SCOPE.to_string()
    } else {
        identity.scope_param()
    };

    debug!(
        agent_id = %identity.agent_id,
        client_id = %app.client_id,
        "initiating actor-token handshake"
    );

    let state = initiate_authorization(&client, provider, app, &scope, &pkce.challenge).await?;

    let code = match state {
        FlowState::DirectCode { code } => {
            // Trusting a provider-side session for a non-human identity is a
            // judgment call; surface it so operators can see when a token
            // was minted without a fresh authentication event.
            warn!(
                agent_id = %identity.agent_id,
                "provider short-circuited on an existing session; skipping authentication step"
            );
            code
        }
        FlowState::AwaitingAuthn { flow_id } => {
            debug!(agent_id = %identity.agent_id, %flow_id, "authenticating agent");
            authenticate_agent(&client, provider, &flow_id, identity).await?
        }
    };

    let raw = redeem_code(&client, provider, app, &code, &pkce.verifier).await?;
    let token = ActorToken::new(raw);
    info!(agent_id = %identity.agent_id, "actor token issued");

    Ok(token)
}

/// Step 1: authorization initiation with `response_mode=direct`.
///
/// The PKCE challenge is sent here; the verifier is withheld until step 3.
async fn initiate_authorization(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    app: &ClientApplication,
    scope: &str,
    code_challenge: &str,
) -> Result<FlowState> {
    let form = [
        ("client_id", app.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", provider.redirect_uri.as_str()),
        ("scope", scope),
        ("response_mode", "direct"),
        ("code_challenge", code_challenge),
        ("code_challenge_method", "S256"),
    ];

    let response = client
        .post(provider.authorize_url())
        .basic_auth(&app.client_id, Some(&app.client_secret))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Authentication(format!(
            "authorize endpoint rejected the request ({status}): {body}"
        )));
    }

    let body: HandshakeResponse = response.json().await?;

    if body.is_completed() {
        if let Some(code) = body.code() {
            return Ok(FlowState::DirectCode {
                code: code.to_string(),
            });
        }
    }

    match body.flow_id {
        Some(flow_id) => Ok(FlowState::AwaitingAuthn { flow_id }),
        // Neither a flowId nor a code: the application registration or the
        // provider configuration is broken.
        None => Err(AuthError::Protocol(format!(
            "authorize response carried neither flowId nor code (flowStatus: {:?})",
            body.flow_status
        ))),
    }
}

/// Step 2: authenticate the agent with its own credentials.
async fn authenticate_agent(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    flow_id: &str,
    identity: &AgentIdentity,
) -> Result<String> {
    let request = AuthnRequest {
        flow_id,
        selected_authenticator: SelectedAuthenticator {
            authenticator_id: &provider.authenticator_id,
            params: AuthnParams {
                username: &identity.agent_id,
                password: &identity.agent_secret,
            },
        },
    };

    let response = client
        .post(provider.authn_url())
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Authentication(format!(
            "authn endpoint rejected agent credentials ({status}): {body}"
        )));
    }

    let body: HandshakeResponse = response.json().await?;

    match body.code() {
        Some(code) => Ok(code.to_string()),
        None if !body.is_completed() => Err(AuthError::Authentication(format!(
            "authentication did not complete (flowStatus: {:?})",
            body.flow_status
        ))),
        None => Err(AuthError::Protocol(
            "authn response completed without an authorization code".to_string(),
        )),
    }
}

/// Step 3: redeem the single-use authorization code for the actor token.
///
/// The PKCE verifier is transmitted here for the first and only time.
async fn redeem_code(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    app: &ClientApplication,
    code: &str,
    code_verifier: &str,
) -> Result<String> {
    let form = [
        ("grant_type", "authorization_code"),
        ("client_id", app.client_id.as_str()),
        ("client_secret", app.client_secret.as_str()),
        ("code", code),
        ("code_verifier", code_verifier),
        ("redirect_uri", provider.redirect_uri.as_str()),
    ];

    let response = client
        .post(provider.token_url())
        .form(&form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Authentication(format!(
            "token endpoint rejected code redemption ({status}): {body}"
        )));
    }

    let body: TokenResponse = response.json().await?;

    body.access_token
        .ok_or_else(|| AuthError::Protocol("token response missing access_token".to_string()))
}
