use miette::Diagnostic;
use thiserror::Error;

/// Errors emitted by the OAuth helpers.
///
/// Verification never surfaces these to callers directly; the verifier
/// records them into [`crate::VerificationResult`] instead.
#[derive(Debug, Error, Diagnostic)]
pub enum OAuthError {
    /// PKCE contract violation
    #[error("pkce error: {0}")]
    #[diagnostic(
        code(playground_oauth::pkce),
        help("only S256 is supported; verifier length must be within 43..=128")
    )]
    Pkce(String),
    /// Signing error
    #[error("signing error: {0}")]
    #[diagnostic(
        code(playground_oauth::signing),
        help("check RS256 key material and input payloads")
    )]
    Signing(String),
    /// Invalid or unsupported JWK
    #[error("invalid JWK: {0}")]
    #[diagnostic(
        code(playground_oauth::jwk),
        help("ensure an RSA JWK with base64url n and e values")
    )]
    Jwk(String),
    /// Structurally bad compact JWT
    #[error("malformed token: {0}")]
    #[diagnostic(code(playground_oauth::token))]
    MalformedToken(String),
    /// Serialization error
    #[error(transparent)]
    #[diagnostic(code(playground_oauth::serde))]
    Serde(#[from] serde_json::Error),
    /// URL error
    #[error(transparent)]
    #[diagnostic(code(playground_oauth::url))]
    Url(#[from] url::ParseError),
    /// Metadata or JWKS fetch failed. Terminal for that attempt, no retry.
    #[error("network failure: {0}")]
    #[diagnostic(
        code(playground_oauth::network),
        help("metadata/JWKS endpoints must be reachable; there is no automatic retry")
    )]
    Network(String),
    #[error("http status: {0}")]
    #[diagnostic(
        code(playground_oauth::http_status),
        help("check the discovery and JWKS URLs against the identity provider")
    )]
    HttpStatus(http::StatusCode),
    /// Key or PEM error from the PKI layer
    #[error(transparent)]
    #[diagnostic(code(playground_oauth::pki))]
    Pki(#[from] playground_pki::PkiError),
}

pub type Result<T> = core::result::Result<T, OAuthError>;
