//! End-to-end flow: generate a key pair, self-sign a certificate, and build
//! a client assertion carrying the certificate's thumbprints.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use playground_oauth::assertion::{AssertionParams, build_client_assertion};
use playground_oauth::token;
use playground_pki::{CertificateParams, create_self_signed_certificate, generate_rsa_key_pair};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::sha2::Sha256;
use signature::Verifier;

const CLIENT_ID: &str = "3e5dcd2a-94a2-4a6a-a0b1-3046e5f1bb20";
const TOKEN_ENDPOINT: &str = "https://login.microsoftonline.com/contoso.example/oauth2/v2.0/token";

#[test]
fn certificate_thumbprints_flow_into_the_assertion_header() {
    let pair = generate_rsa_key_pair().unwrap();
    let cert = create_self_signed_certificate(
        CertificateParams::new()
            .public_key_pem(&pair.public_key_pem)
            .private_key(&pair.private_key)
            .subject("CN=Assertion Flow Test".to_string())
            .build(),
    )
    .unwrap();

    let assertion = build_client_assertion(
        AssertionParams::new()
            .client_id(CLIENT_ID)
            .token_endpoint(TOKEN_ENDPOINT)
            .private_key_pem(&pair.private_key_pem)
            .kid(&cert.thumbprint_sha1)
            .x5t(&cert.thumbprint_sha1_base64url)
            .build(),
    )
    .unwrap();

    let (header, payload) = split_and_parse(&assertion);
    assert_eq!(header["alg"], "RS256");
    assert_eq!(header["typ"], "JWT");
    assert_eq!(header["kid"].as_str().unwrap(), cert.thumbprint_sha1);
    assert_eq!(
        header["x5t"].as_str().unwrap(),
        cert.thumbprint_sha1_base64url
    );
    assert_eq!(payload["iss"], CLIENT_ID);
    assert_eq!(payload["sub"], CLIENT_ID);
    assert_eq!(payload["aud"], TOKEN_ENDPOINT);
    assert_eq!(
        payload["exp"].as_i64().unwrap() - payload["iat"].as_i64().unwrap(),
        60
    );

    // The assertion must verify under the same public key the certificate
    // certifies.
    let (signed, signature) = assertion.rsplit_once('.').unwrap();
    let signature =
        Signature::try_from(URL_SAFE_NO_PAD.decode(signature).unwrap().as_slice()).unwrap();
    VerifyingKey::<Sha256>::new(pair.public_key.clone())
        .verify(signed.as_bytes(), &signature)
        .unwrap();

    // And the display decoder renders the same claims.
    let decoded = token::decode(&assertion);
    assert!(decoded.header.contains(&cert.thumbprint_sha1));
    assert!(decoded.payload.contains(CLIENT_ID));
}

fn split_and_parse(jwt: &str) -> (serde_json::Value, serde_json::Value) {
    let mut sections = jwt.split('.');
    let header = URL_SAFE_NO_PAD.decode(sections.next().unwrap()).unwrap();
    let payload = URL_SAFE_NO_PAD.decode(sections.next().unwrap()).unwrap();
    (
        serde_json::from_slice(&header).unwrap(),
        serde_json::from_slice(&payload).unwrap(),
    )
}
