use miette::Diagnostic;
use thiserror::Error;

/// Errors emitted by key, certificate, and DER helpers.
#[derive(Debug, Error, Diagnostic)]
pub enum PkiError {
    /// The platform CSPRNG could not produce bytes. Fatal, not retried.
    #[error("no usable CSPRNG: {0}")]
    #[diagnostic(
        code(playground_pki::csprng),
        help("the OS random source is unavailable; nothing in this crate works without it")
    )]
    CryptoUnavailable(String),
    /// Key generation failed
    #[error("RSA key generation failed: {0}")]
    #[diagnostic(code(playground_pki::keygen))]
    KeyGeneration(#[from] rsa::Error),
    /// Bad PEM input from the caller
    #[error("malformed PEM: {0}")]
    #[diagnostic(
        code(playground_pki::pem),
        help("expected a PKCS#8 private key or SubjectPublicKeyInfo public key in PEM form")
    )]
    MalformedPem(String),
    /// Signing error
    #[error("signing error: {0}")]
    #[diagnostic(
        code(playground_pki::signing),
        help("check the RSA private key material and input bytes")
    )]
    Signing(String),
    /// DER encoding contract violated. Caller bug, not recoverable input.
    #[error("DER encoding contract violated: {0}")]
    #[diagnostic(code(playground_pki::asn1))]
    Asn1(String),
}

pub type Result<T> = core::result::Result<T, PkiError>;
