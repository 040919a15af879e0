//! JWT signature verification against a dynamically resolved JWKS.
//!
//! The pipeline never fails fast: every attempt produces a
//! [`VerificationResult`] populated as far as verification progressed, so a
//! UI checklist can render partial progress. Errors are recorded into the
//! result instead of being returned.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use http::{Request, StatusCode};
use rsa::pkcs1v15::VerifyingKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::sha2::Sha256;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use signature::Verifier;
use tracing::{debug, warn};
use url::Url;

use crate::error::{OAuthError, Result};
use crate::http_client::HttpClient;
use crate::token;

/// A published JSON Web Key, restricted to the RSA members the verifier uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// base64url modulus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// base64url public exponent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

/// The slice of an OIDC discovery document the playground reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcMetadata {
    pub jwks_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
}

/// One place a JWKS may be found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JwksCandidate {
    /// A URL serving the key set directly
    Keys(Url),
    /// An OIDC discovery document whose `jwks_uri` field points at the keys
    Discovery(Url),
}

impl fmt::Display for JwksCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwksCandidate::Keys(url) => write!(f, "{url}"),
            JwksCandidate::Discovery(url) => write!(f, "{url} -> jwks_uri"),
        }
    }
}

/// Diagnostic record of a verification attempt.
///
/// Every field is filled in as far as the pipeline progressed, success or
/// not. `reason` explains where and why it stopped; `error` carries the
/// underlying failure when there is one.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub key_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// The token's `ver` claim, when present (Microsoft tokens carry one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_pem: Option<String>,
}

/// OIDC discovery URL for an issuer.
pub fn build_metadata_url(issuer: &str) -> String {
    format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    )
}

/// An ordered JWKS-resolution rule: the first rule whose host predicate
/// matches the issuer decides the candidate list.
struct JwksRule {
    name: &'static str,
    applies: fn(&str) -> bool,
    build: fn(&str, Option<&str>, Option<&str>) -> Vec<JwksCandidate>,
}

static JWKS_RULES: &[JwksRule] = &[JwksRule {
    name: "microsoft-identity-platform",
    applies: is_microsoft_host,
    build: microsoft_candidates,
}];

fn is_microsoft_host(host: &str) -> bool {
    [
        "login.microsoftonline.com",
        "login.windows.net",
        "sts.windows.net",
    ]
    .iter()
    .any(|needle| host.contains(needle))
}

fn microsoft_candidates(
    _issuer: &str,
    tenant_id: Option<&str>,
    token_version: Option<&str>,
) -> Vec<JwksCandidate> {
    let tenant = tenant_id.filter(|t| !t.is_empty()).unwrap_or("common");
    let v2 = format!("https://login.microsoftonline.com/{tenant}/discovery/v2.0/keys");
    let v1 = format!("https://login.microsoftonline.com/{tenant}/discovery/keys");
    let ordered = if token_version.is_some_and(|v| v.starts_with("1.")) {
        [v1, v2]
    } else {
        [v2, v1]
    };
    ordered
        .iter()
        .filter_map(|u| Url::parse(u).ok())
        .map(JwksCandidate::Keys)
        .collect()
}

fn discovery_candidates(issuer: &str) -> Vec<JwksCandidate> {
    Url::parse(&build_metadata_url(issuer))
        .ok()
        .map(JwksCandidate::Discovery)
        .into_iter()
        .collect()
}

/// Guess where an issuer publishes its JWKS.
///
/// Recognized identity-platform hosts get direct key URLs (v2 first, then
/// the v1 fallback, flipped when the token's `ver` claim says 1.x);
/// everything else falls back to OIDC discovery.
pub fn guess_jwks_url(
    issuer: &str,
    tenant_id: Option<&str>,
    token_version: Option<&str>,
) -> Vec<JwksCandidate> {
    if let Some(host) = Url::parse(issuer)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    {
        for rule in JWKS_RULES {
            if (rule.applies)(&host) {
                debug!(rule = rule.name, issuer, "JWKS resolution rule matched");
                return (rule.build)(issuer, tenant_id, token_version);
            }
        }
    }
    discovery_candidates(issuer)
}

/// Import an RSA JWK as an RSASSA-PKCS1-v1_5 public key.
pub fn rsa_public_key_from_jwk(jwk: &Jwk) -> Result<RsaPublicKey> {
    if !jwk.kty.eq_ignore_ascii_case("RSA") {
        return Err(OAuthError::Jwk(format!("kty {} is not RSA", jwk.kty)));
    }
    let n = jwk
        .n
        .as_deref()
        .ok_or_else(|| OAuthError::Jwk("missing modulus n".into()))?;
    let e = jwk
        .e
        .as_deref()
        .ok_or_else(|| OAuthError::Jwk("missing exponent e".into()))?;
    let n = URL_SAFE_NO_PAD
        .decode(n)
        .map_err(|e| OAuthError::Jwk(format!("modulus is not base64url: {e}")))?;
    let e = URL_SAFE_NO_PAD
        .decode(e)
        .map_err(|e| OAuthError::Jwk(format!("exponent is not base64url: {e}")))?;
    RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
        .map_err(|e| OAuthError::Jwk(e.to_string()))
}

/// SubjectPublicKeyInfo PEM for a verified key, for display.
pub fn export_public_key_pem(key: &RsaPublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| OAuthError::Jwk(e.to_string()))
}

/// Verifies compact JWTs against JWKS documents fetched over `C`.
///
/// The JWKS cache is keyed by URL and lives as long as the verifier, with
/// no TTL and no de-duplication of concurrent in-flight fetches for the
/// same URL: two simultaneous verifications may each fetch the key set.
pub struct SignatureVerifier<C> {
    client: C,
    jwks_cache: DashMap<String, JwkSet>,
}

impl<C: HttpClient + Sync> SignatureVerifier<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            jwks_cache: DashMap::new(),
        }
    }

    /// Try each candidate in order, stopping at the first that both resolves
    /// a key and verifies. When none verifies, the result reflects the last
    /// attempt.
    pub async fn verify_token(
        &self,
        token: &str,
        candidates: &[JwksCandidate],
        expected_kid: Option<&str>,
    ) -> VerificationResult {
        let mut last = VerificationResult {
            reason: Some("no JWKS URL candidates to try".to_string()),
            ..Default::default()
        };
        for candidate in candidates {
            debug!(%candidate, "attempting verification");
            let result = self.verify(token, candidate, expected_kid).await;
            if result.ok {
                return result;
            }
            last = result;
        }
        last
    }

    /// One verification attempt against a single JWKS candidate.
    pub async fn verify(
        &self,
        token: &str,
        candidate: &JwksCandidate,
        expected_kid: Option<&str>,
    ) -> VerificationResult {
        let mut result = VerificationResult::default();

        let Some((header, payload)) = token::decode_parts(token) else {
            result.reason =
                Some("malformed JWT: expected three base64url-encoded sections".to_string());
            return result;
        };
        result.alg = header
            .get("alg")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        result.kid = header
            .get("kid")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        result.iss = payload
            .get("iss")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        result.ver = payload.get("ver").map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        match result.alg.as_deref() {
            Some(alg) if alg.starts_with("RS") => {}
            Some(alg) => {
                result.reason = Some(format!(
                    "unsupported algorithm {alg}: only RSA (RS*) signatures are supported"
                ));
                return result;
            }
            None => {
                result.reason = Some("token header carries no alg".to_string());
                return result;
            }
        }

        let jwks = match self.fetch_jwks(candidate).await {
            Ok(jwks) => jwks,
            Err(e) => {
                result.reason = Some(format!("failed to fetch JWKS from {candidate}"));
                result.error = Some(e.to_string());
                return result;
            }
        };

        let wanted = expected_kid
            .map(str::to_string)
            .or_else(|| result.kid.clone());
        let Some(wanted) = wanted else {
            result.reason =
                Some("no kid to match: token has none and none was supplied".to_string());
            return result;
        };
        let Some(jwk) = jwks
            .keys
            .iter()
            .find(|k| k.kid.as_deref() == Some(wanted.as_str()))
        else {
            result.reason = Some(format!("no key with kid {wanted} in the JWKS"));
            return result;
        };
        result.key_found = true;
        debug!(kid = %wanted, "matched JWKS key");

        let public_key = match rsa_public_key_from_jwk(jwk) {
            Ok(key) => key,
            Err(e) => {
                result.reason =
                    Some("matched key could not be imported as an RSA public key".to_string());
                result.error = Some(e.to_string());
                return result;
            }
        };

        // Signature input is the first two sections verbatim.
        let Some((signed, signature_b64)) = token.rsplit_once('.') else {
            result.reason = Some("malformed JWT: no signature section".to_string());
            return result;
        };
        let signature_bytes = match URL_SAFE_NO_PAD.decode(signature_b64) {
            Ok(bytes) => bytes,
            Err(e) => {
                result.reason = Some("signature section is not valid base64url".to_string());
                result.error = Some(e.to_string());
                return result;
            }
        };
        let signature = match rsa::pkcs1v15::Signature::try_from(signature_bytes.as_slice()) {
            Ok(signature) => signature,
            Err(e) => {
                result.reason = Some("signature bytes are not a valid RSA signature".to_string());
                result.error = Some(e.to_string());
                return result;
            }
        };

        let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
        match verifying_key.verify(signed.as_bytes(), &signature) {
            Ok(()) => {
                result.ok = true;
                result.reason = Some("signature verified".to_string());
                // Best-effort display artifact; must never flip the outcome.
                match export_public_key_pem(&public_key) {
                    Ok(pem) => result.public_key_pem = Some(pem),
                    Err(e) => warn!(error = %e, "verified key could not be exported as PEM"),
                }
            }
            Err(e) => {
                result.reason =
                    Some("signature does not verify under the matched key".to_string());
                result.error = Some(e.to_string());
            }
        }
        result
    }

    async fn fetch_jwks(&self, candidate: &JwksCandidate) -> Result<JwkSet> {
        let url = match candidate {
            JwksCandidate::Keys(url) => url.clone(),
            JwksCandidate::Discovery(metadata_url) => {
                let metadata: OidcMetadata = self.get_json(metadata_url).await?;
                debug!(jwks_uri = %metadata.jwks_uri, "resolved jwks_uri from OIDC metadata");
                Url::parse(&metadata.jwks_uri)?
            }
        };
        if let Some(cached) = self.jwks_cache.get(url.as_str()) {
            debug!(%url, "JWKS cache hit");
            return Ok(cached.clone());
        }
        debug!(%url, "fetching JWKS");
        let jwks: JwkSet = self.get_json(&url).await?;
        self.jwks_cache.insert(url.to_string(), jwks.clone());
        Ok(jwks)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let request = Request::builder()
            .uri(url.as_str())
            .body(Vec::new())
            .map_err(|e| OAuthError::Network(e.to_string()))?;
        let response = self
            .client
            .send_http(request)
            .await
            .map_err(|e| OAuthError::Network(e.to_string()))?;
        if response.status() != StatusCode::OK {
            return Err(OAuthError::HttpStatus(response.status()));
        }
        Ok(serde_json::from_slice(response.body())?)
    }
}
