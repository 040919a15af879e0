//! OAuth2/OIDC playground core: PKCE, RFC 7523 client assertions, token
//! decoding, and JWT signature verification against a resolved JWKS.
//!
//! Key and certificate material comes from `playground-pki`. This crate has
//! no UI or network surface of its own beyond the [`http_client::HttpClient`]
//! seam the verifier fetches metadata and key sets through.

pub mod assertion;
pub mod error;
pub mod http_client;
pub mod jose;
pub mod pkce;
pub mod token;
pub mod verifier;

pub use error::{OAuthError, Result};
pub use verifier::{SignatureVerifier, VerificationResult};
