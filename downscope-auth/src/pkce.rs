//! PKCE (RFC 7636) verifier/challenge generation
//!
//! Binds the party that initiates an authorization handshake to the party
//! that later redeems the authorization code.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes backing the code verifier (512 bits)
const VERIFIER_BYTES: usize = 64;

/// A PKCE verifier and its S256 challenge.
///
/// The verifier must only ever be sent in the final token-issuance call;
/// the challenge is sent in the initial authorize call.
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// High-entropy secret, base64url without padding
    pub verifier: String,

    /// base64url(SHA-256(verifier)), no padding
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier/challenge pair from the OS entropy source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = Self::challenge_for(&verifier);

        Self {
            verifier,
            challenge,
        }
    }

    /// Derive the S256 challenge for a given verifier.
    ///
    /// Pure function: the challenge is never chosen independently of the
    /// verifier.
    pub fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}
