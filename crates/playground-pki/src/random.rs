//! CSPRNG-backed byte and identifier generation.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{PkiError, Result};

/// The unreserved URL-safe alphabet, 64 characters so a masked byte maps
/// uniformly onto it.
const URL_SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub const DEFAULT_URL_SAFE_LENGTH: usize = 32;

/// Fill `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| PkiError::CryptoUnavailable(e.to_string()))?;
    Ok(bytes)
}

/// Random string over `[A-Za-z0-9_-]`, suitable for OAuth `state` and `nonce`.
pub fn random_url_safe_string(len: usize) -> Result<String> {
    let bytes = random_bytes(len)?;
    Ok(bytes
        .iter()
        .map(|b| URL_SAFE_ALPHABET[(b & 0x3f) as usize] as char)
        .collect())
}

/// OAuth `state` parameter (32 URL-safe characters).
pub fn random_state() -> Result<String> {
    random_url_safe_string(DEFAULT_URL_SAFE_LENGTH)
}

/// OpenID Connect `nonce` parameter (32 URL-safe characters).
pub fn random_nonce() -> Result<String> {
    random_url_safe_string(DEFAULT_URL_SAFE_LENGTH)
}

/// UUID-v4-shaped identifier for `jti` claims.
///
/// 128 bits of CSPRNG entropy with the version/variant bits set; no
/// uniqueness guarantee beyond that entropy.
pub fn random_guid_like() -> Result<String> {
    let bytes = random_bytes(16)?;
    let mut raw = [0u8; 16];
    raw.copy_from_slice(&bytes);
    Ok(uuid::Builder::from_random_bytes(raw)
        .into_uuid()
        .to_string())
}
