//! Three-step handshake tests against a stubbed identity provider

use downscope_auth::{get_actor_token, AgentIdentity, AuthError, ClientApplication, ProviderConfig};
use mockito::Matcher;
use serde_json::json;

fn provider_for(server: &mockito::ServerGuard) -> ProviderConfig {
    ProviderConfig::new(server.url(), "http://localhost:8000/callback").with_timeout_secs(5)
}

fn hr_agent() -> AgentIdentity {
    AgentIdentity::new(
        "hr-agent",
        "hr-secret",
        vec!["hr:read".into(), "hr:write".into()],
        "onboarding-api",
    )
    .unwrap()
}

fn exchanger_app() -> ClientApplication {
    ClientApplication::new("exchanger-client", "exchanger-secret").unwrap()
}

#[tokio::test]
async fn three_step_flow_returns_provider_token_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    let authorize = server
        .mock("POST", "/oauth2/authorize")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "exchanger-client".into()),
            Matcher::UrlEncoded("response_type".into(), "code".into()),
            Matcher::UrlEncoded("response_mode".into(), "direct".into()),
            Matcher::UrlEncoded("scope".into(), "hr:read hr:write".into()),
            Matcher::UrlEncoded("code_challenge_method".into(), "S256".into()),
            Matcher::Regex("code_challenge=[A-Za-z0-9_-]{43}".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"flowId": "f1", "flowStatus": "INCOMPLETE"}).to_string())
        .create_async()
        .await;

    let authn = server
        .mock("POST", "/oauth2/authn")
        .match_body(Matcher::PartialJson(json!({
            "flowId": "f1",
            "selectedAuthenticator": {
                "params": {"username": "hr-agent", "password": "hr-secret"}
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"flowStatus": "SUCCESS_COMPLETED", "code": "c1"}).to_string())
        .create_async()
        .await;

    // The verifier must appear here and nowhere else.
    let token = server
        .mock("POST", "/oauth2/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "c1".into()),
            Matcher::Regex("code_verifier=[A-Za-z0-9_-]{80,}".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "tok.eyJzdWIiOiJoci1hZ2VudCJ9.sig"}).to_string())
        .create_async()
        .await;

    let actor = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap();

    assert_eq!(actor.raw, "tok.eyJzdWIiOiJoci1hZ2VudCJ9.sig");
    assert_eq!(actor.claims["sub"], "hr-agent");

    authorize.assert_async().await;
    authn.assert_async().await;
    token.assert_async().await;
}

#[tokio::test]
async fn direct_code_short_circuit_skips_authn() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"flowStatus": "SUCCESS_COMPLETED", "authData": {"code": "c-direct"}})
                .to_string(),
        )
        .create_async()
        .await;

    // Must never be hit on the short-circuit path
    let authn = server
        .mock("POST", "/oauth2/authn")
        .expect(0)
        .create_async()
        .await;

    server
        .mock("POST", "/oauth2/token")
        .match_body(Matcher::UrlEncoded("code".into(), "c-direct".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "tok-direct"}).to_string())
        .create_async()
        .await;

    let actor = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap();

    assert_eq!(actor.raw, "tok-direct");
    authn.assert_async().await;
}

#[tokio::test]
async fn authorize_without_flow_id_or_code_is_protocol_error() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"flowStatus": "INCOMPLETE"}).to_string())
        .create_async()
        .await;

    let err = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Protocol(_)), "got: {err:?}");
}

#[tokio::test]
async fn rejected_agent_credentials_is_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"flowId": "f1", "flowStatus": "INCOMPLETE"}).to_string())
        .create_async()
        .await;

    server
        .mock("POST", "/oauth2/authn")
        .with_status(401)
        .with_body(json!({"flowStatus": "FAIL_INCOMPLETE"}).to_string())
        .create_async()
        .await;

    let err = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Authentication(_)), "got: {err:?}");
}

#[tokio::test]
async fn authn_success_without_code_is_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"flowId": "f1", "flowStatus": "INCOMPLETE"}).to_string())
        .create_async()
        .await;

    server
        .mock("POST", "/oauth2/authn")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"flowStatus": "FAIL_INCOMPLETE"}).to_string())
        .create_async()
        .await;

    let err = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Authentication(_)), "got: {err:?}");
}

#[tokio::test]
async fn missing_access_token_is_protocol_error() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"flowStatus": "SUCCESS_COMPLETED", "code": "c1"}).to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"token_type": "Bearer"}).to_string())
        .create_async()
        .await;

    let err = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Protocol(_)), "got: {err:?}");
}

#[tokio::test]
async fn consumed_code_cannot_be_replayed() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"flowStatus": "SUCCESS_COMPLETED", "code": "c-once"}).to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/oauth2/token")
        .match_body(Matcher::UrlEncoded("code".into(), "c-once".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "tok-once"}).to_string())
        .create_async()
        .await;

    let first = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap();
    assert_eq!(first.raw, "tok-once");

    // Provider invalidates the consumed code: replaying the redemption now
    // fails and the whole flow must be restarted, not resumed.
    server.reset();
    server
        .mock("POST", "/oauth2/authorize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"flowStatus": "SUCCESS_COMPLETED", "code": "c-once"}).to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/oauth2/token")
        .with_status(400)
        .with_body(json!({"error": "invalid_grant"}).to_string())
        .create_async()
        .await;

    let err = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AuthError::Authentication(_) | AuthError::Protocol(_)),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn unreachable_provider_is_network_error() {
    // Nothing listens on the discard port
    let provider = ProviderConfig::new("http://127.0.0.1:9", "http://localhost:8000/callback")
        .with_timeout_secs(2);

    let err = get_actor_token(&provider, &hr_agent(), &exchanger_app())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Network(_)), "got: {err:?}");
    assert!(err.is_retryable());
}
