//! PKCE code verifier and S256 challenge generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::{OAuthError, Result};

pub const CODE_CHALLENGE_METHOD_S256: &str = "S256";
pub const DEFAULT_VERIFIER_LENGTH: usize = 96;

/// RFC 7636 unreserved characters.
const VERIFIER_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Random `code_verifier` of `len` characters.
///
/// https://datatracker.ietf.org/doc/html/rfc7636#section-4.1
pub fn random_code_verifier(len: usize) -> Result<String> {
    if !(43..=128).contains(&len) {
        return Err(OAuthError::Pkce(format!(
            "verifier length {len} outside 43..=128"
        )));
    }
    let bytes = playground_pki::random::random_bytes(len)?;
    Ok(bytes
        .iter()
        .map(|b| VERIFIER_ALPHABET[*b as usize % VERIFIER_ALPHABET.len()] as char)
        .collect())
}

/// S256 `code_challenge`: base64url(SHA-256(verifier)), no padding.
/// The `plain` method is deliberately not implemented.
pub fn compute_s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Fresh (challenge, verifier) pair at the default verifier length.
pub fn generate_pkce() -> Result<(String, String)> {
    let verifier = random_code_verifier(DEFAULT_VERIFIER_LENGTH)?;
    Ok((compute_s256_challenge(&verifier), verifier))
}
