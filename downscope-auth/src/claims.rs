//! Unverified JWT claim extraction
//!
//! Display-only: no signature verification is performed and nothing here may
//! feed an authorization decision. Malformed tokens yield an empty claim set
//! rather than an error so that diagnostics never break a protocol path.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

/// Decode the payload segment of a JWT without verifying it.
///
/// Returns an empty map on any malformation (wrong segment count, invalid
/// base64, non-object payload).
pub fn decode_claims(token: &str) -> Map<String, Value> {
    try_decode(token).unwrap_or_default()
}

fn try_decode(token: &str) -> Option<Map<String, Value>> {
    let payload = token.split('.').nth(1)?;
    // Tolerate both padded and unpadded encodings
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<Value>(&decoded).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Render the claims most useful when eyeballing a delegated token.
///
/// Shows subject, audience, granted scope, and the actor claim when present.
pub fn display_summary(claims: &Map<String, Value>) -> String {
    let get = |key: &str| {
        claims
            .get(key)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "N/A".to_string())
    };

    let mut summary = format!(
        "sub={} aud={} scope={}",
        get("sub"),
        get("aud"),
        get("scope")
    );
    if claims.contains_key("act") {
        summary.push_str(&format!(" act={}", get("act")));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_jwt(payload: &Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("eyJhbGciOiJSUzI1NiJ9.{}.c2ln", body)
    }

    #[test]
    fn test_decodes_payload_claims() {
        let token = make_jwt(&json!({
            "sub": "agent-1",
            "aud": "onboarding-api",
            "scope": "hr:read hr:write",
        }));

        let claims = decode_claims(&token);
        assert_eq!(claims["sub"], "agent-1");
        assert_eq!(claims["scope"], "hr:read hr:write");
    }

    #[test]
    fn test_tolerates_padded_payload() {
        let body = base64::engine::general_purpose::URL_SAFE
            .encode(serde_json::to_vec(&json!({"sub": "a"})).unwrap());
        let token = format!("h.{}.s", body);
        assert_eq!(decode_claims(&token)["sub"], "a");
    }

    #[test]
    fn test_malformed_inputs_yield_empty_map() {
        for bad in [
            "",
            "not-a-jwt",
            "only.%%%invalid-base64%%%.sig",
            "a.b",               // undecodable payload
            "h.WyJub3QiLCJhbiIsIm9iamVjdCJd.s", // JSON array payload
        ] {
            assert!(decode_claims(bad).is_empty(), "input: {bad}");
        }
    }

    #[test]
    fn test_display_summary_includes_actor_when_present() {
        let claims = decode_claims(&make_jwt(&json!({
            "sub": "orchestrator",
            "aud": "onboarding-api",
            "scope": "hr:read",
            "act": {"sub": "hr-agent"},
        })));

        let summary = display_summary(&claims);
        assert!(summary.contains("sub=orchestrator"));
        assert!(summary.contains("act="));
    }
}
