//! Token exchange (RFC 8693) downscoping step
//!
//! Fuses a subject token (the orchestrator's actor token) with an actor
//! token (a worker agent's own proof of identity) into a new token bound to
//! a narrow scope set. The provider is the scope authority: the granted
//! scope may be narrower than requested and is accepted as-is, but the
//! request itself never widens beyond the caller's declared scopes.

use crate::error::{AuthError, Result};
use crate::flow::TokenResponse;
use crate::identity::{join_scopes, ClientApplication};
use crate::provider::ProviderConfig;
use crate::token::{ActorToken, DelegatedToken};
use tracing::{debug, info};

/// RFC 8693 token-exchange grant type
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// RFC 8693 access-token token-type identifier
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Exchange (subject, actor) for a downscoped delegated token.
///
/// Executed under the token-exchanger application's credentials via basic
/// auth. `target_scopes` is sent sorted and space-joined, exactly as
/// configured for the worker.
pub async fn exchange_downscope(
    provider: &ProviderConfig,
    exchanger_app: &ClientApplication,
    subject_token: &ActorToken,
    actor_token: &ActorToken,
    target_scopes: &[String],
) -> Result<DelegatedToken> {
    let client = provider.build_client()?;
    let scope = join_scopes(target_scopes);

    debug!(%scope, "requesting token exchange");

    let form = [
        ("grant_type", GRANT_TYPE_TOKEN_EXCHANGE),
        ("subject_token", subject_token.raw.as_str()),
        ("subject_token_type", TOKEN_TYPE_ACCESS_TOKEN),
        ("actor_token", actor_token.raw.as_str()),
        ("actor_token_type", TOKEN_TYPE_ACCESS_TOKEN),
        ("scope", scope.as_str()),
    ];

    let response = client
        .post(provider.token_url())
        .basic_auth(&exchanger_app.client_id, Some(&exchanger_app.client_secret))
        .form(&form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Authentication(format!(
            "token exchange rejected ({status}): {body}"
        )));
    }

    let body: TokenResponse = response.json().await?;

    let raw = body
        .access_token
        .ok_or_else(|| AuthError::Protocol("exchange response missing access_token".to_string()))?;

    let delegated = DelegatedToken::new(raw, body.scope.as_deref());

    let granted = join_scopes(&delegated.scope);
    if !granted.is_empty() && granted != scope {
        // Narrower grants are valid; the provider decides.
        debug!(requested = %scope, %granted, "provider granted a different scope set");
    }
    info!(%granted, "delegated token issued");

    Ok(delegated)
}
