//! RFC 7523 client assertions for `private_key_jwt` authentication.

use bon::Builder;
use chrono::Utc;
use rsa::pkcs1v15::SigningKey;
use rsa::sha2::Sha256;

use crate::error::{OAuthError, Result};
use crate::jose::{create_signed_jwt, jws::Header, jwt::Claims};

pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
pub const DEFAULT_LIFETIME_SECS: i64 = 60;

/// Inputs for [`build_client_assertion`].
///
/// `kid` conventionally carries the certificate's hex SHA-1 thumbprint and
/// `x5t` its base64url SHA-1 thumbprint, matching identity-provider portal
/// conventions. Both are caller-supplied; consistency with the registered
/// certificate is the caller's responsibility.
#[derive(Builder)]
#[builder(start_fn = new)]
pub struct AssertionParams<'a> {
    pub client_id: &'a str,
    pub token_endpoint: &'a str,
    /// PKCS#8 private key PEM that signs the assertion
    pub private_key_pem: &'a str,
    pub kid: Option<&'a str>,
    pub x5t: Option<&'a str>,
    #[builder(default = DEFAULT_LIFETIME_SECS)]
    pub lifetime_secs: i64,
}

/// Claim set for a client assertion, without signing. Used for previewing
/// an assertion before committing to a real token exchange.
///
/// Invariants: `iss == sub == client_id`, `aud` is the token endpoint,
/// `exp - iat == lifetime_secs`, and `jti` is fresh per call.
pub fn build_client_assertion_claims(
    client_id: &str,
    token_endpoint: &str,
    lifetime_secs: i64,
) -> Result<Claims> {
    let iat = Utc::now().timestamp();
    Ok(Claims {
        iss: Some(client_id.to_string()),
        sub: Some(client_id.to_string()),
        aud: Some(token_endpoint.to_string()),
        exp: Some(iat + lifetime_secs),
        iat: Some(iat),
        jti: Some(playground_pki::random::random_guid_like()?),
        ..Default::default()
    })
}

/// Build and sign a compact RS256 client assertion.
pub fn build_client_assertion(params: AssertionParams<'_>) -> Result<String> {
    let private_key = playground_pki::keys::private_key_from_pem(params.private_key_pem)?;
    let signing_key = SigningKey::<Sha256>::new(private_key);

    let mut header = Header::rs256();
    header.kid = params.kid.map(str::to_string);
    header.x5t = params.x5t.map(str::to_string);

    let claims = build_client_assertion_claims(
        params.client_id,
        params.token_endpoint,
        params.lifetime_secs,
    )?;
    create_signed_jwt(&signing_key, &header, &claims).map_err(OAuthError::Serde)
}
