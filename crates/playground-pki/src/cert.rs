//! Self-signed X.509v3 certificate assembly.
//!
//! The TBSCertificate is built by hand from the DER primitives in [`crate::asn1`]
//! and signed RSASSA-PKCS1-v1_5/SHA-256. No extensions are emitted.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use bon::Builder;
use chrono::{DateTime, Utc};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::sha2::Sha256;
use sha1::Sha1;
use sha2::Digest;
use signature::{SignatureEncoding, Signer};

use crate::error::Result;
use crate::{asn1, keys, random};

pub const DEFAULT_SUBJECT: &str = "CN=OAuth Playground Demo";
pub const DEFAULT_VALID_DAYS: i64 = 365;

/// Inputs for [`create_self_signed_certificate`].
#[derive(Builder)]
#[builder(start_fn = new)]
pub struct CertificateParams<'a> {
    /// SubjectPublicKeyInfo PEM to embed as the certified key
    pub public_key_pem: &'a str,
    /// Private key that signs the certificate (the pair of `public_key_pem`
    /// for a self-signed certificate)
    pub private_key: &'a RsaPrivateKey,
    /// Subject (and issuer) distinguished name
    #[builder(default = DEFAULT_SUBJECT.to_string())]
    pub subject: String,
    #[builder(default = DEFAULT_VALID_DAYS)]
    pub valid_days: i64,
}

/// A generated certificate plus every derived form the playground displays.
///
/// All four thumbprints are hashes of `der`, never of the PEM text.
#[derive(Clone, Debug)]
pub struct Certificate {
    pub der: Vec<u8>,
    pub pem: String,
    pub serial_number: [u8; 8],
    pub subject_dn: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub thumbprint_sha1: String,
    pub thumbprint_sha256: String,
    pub thumbprint_sha1_base64url: String,
    pub thumbprint_sha256_base64url: String,
}

/// Assemble and sign a self-signed X.509v3 certificate.
///
/// The serial number is 8 fresh CSPRNG bytes, so two certificates for the
/// same key and subject are never byte-identical.
pub fn create_self_signed_certificate(params: CertificateParams<'_>) -> Result<Certificate> {
    let spki = keys::spki_from_public_pem(params.public_key_pem)?;
    let subject_name = asn1::encode_distinguished_name(&params.subject)?;

    let mut serial_number = [0u8; 8];
    serial_number.copy_from_slice(&random::random_bytes(8)?);

    let not_before = Utc::now();
    let not_after = not_before + chrono::Duration::days(params.valid_days);

    let algorithm_id = asn1::encode_sequence(&[
        asn1::encode_oid(asn1::OID_SHA256_WITH_RSA)?,
        asn1::encode_null(),
    ]);
    // version [0] EXPLICIT INTEGER 2 (v3)
    let version = asn1::encode(asn1::tag::CONTEXT_0, &asn1::encode_integer(&[2]));
    let validity = asn1::encode_sequence(&[
        asn1::encode_utc_time(&not_before),
        asn1::encode_utc_time(&not_after),
    ]);
    let tbs_certificate = asn1::encode_sequence(&[
        version,
        asn1::encode_integer(&serial_number),
        algorithm_id.clone(),
        // issuer == subject for a self-signed certificate
        subject_name.clone(),
        validity,
        subject_name,
        spki,
    ]);

    let signing_key = SigningKey::<Sha256>::new(params.private_key.clone());
    let signature = signing_key.sign(&tbs_certificate);
    let der = asn1::encode_sequence(&[
        tbs_certificate,
        algorithm_id,
        asn1::encode_bit_string(&signature.to_bytes()),
    ]);

    let sha1_digest = Sha1::digest(&der);
    let sha256_digest = sha2::Sha256::digest(&der);

    Ok(Certificate {
        pem: wrap_pem("CERTIFICATE", &der),
        serial_number,
        subject_dn: params.subject,
        not_before,
        not_after,
        thumbprint_sha1: hex::encode(sha1_digest),
        thumbprint_sha256: hex::encode(sha256_digest),
        thumbprint_sha1_base64url: URL_SAFE_NO_PAD.encode(sha1_digest),
        thumbprint_sha256_base64url: URL_SAFE_NO_PAD.encode(sha256_digest),
        der,
    })
}

fn wrap_pem(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut out = format!("-----BEGIN {label}-----\n");
    for chunk in body.as_bytes().chunks(64) {
        out.extend(chunk.iter().map(|&b| b as char));
        out.push('\n');
    }
    out.push_str("-----END ");
    out.push_str(label);
    out.push_str("-----\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_rsa_key_pair;
    use rsa::pkcs1v15::VerifyingKey;
    use signature::Verifier;

    /// Reads one TLV, returning (tag, whole element, content, rest).
    fn read_tlv(buf: &[u8]) -> (u8, &[u8], &[u8], &[u8]) {
        let tag = buf[0];
        let (len, header) = if buf[1] < 0x80 {
            (buf[1] as usize, 2)
        } else {
            let n = (buf[1] & 0x7f) as usize;
            let mut len = 0usize;
            for i in 0..n {
                len = (len << 8) | buf[2 + i] as usize;
            }
            (len, 2 + n)
        };
        (
            tag,
            &buf[..header + len],
            &buf[header..header + len],
            &buf[header + len..],
        )
    }

    fn demo_certificate() -> (crate::KeyPair, Certificate) {
        let pair = generate_rsa_key_pair().unwrap();
        let cert = create_self_signed_certificate(
            CertificateParams::new()
                .public_key_pem(&pair.public_key_pem)
                .private_key(&pair.private_key)
                .build(),
        )
        .unwrap();
        (pair, cert)
    }

    #[test]
    fn der_is_a_sequence_spanning_the_buffer() {
        let (_, cert) = demo_certificate();
        let (tag, whole, _, rest) = read_tlv(&cert.der);
        assert_eq!(tag, asn1::tag::SEQUENCE);
        assert_eq!(whole.len(), cert.der.len());
        assert!(rest.is_empty());
    }

    #[test]
    fn thumbprints_recompute_from_der() {
        let (_, cert) = demo_certificate();
        assert_eq!(cert.thumbprint_sha1, hex::encode(Sha1::digest(&cert.der)));
        assert_eq!(
            cert.thumbprint_sha256,
            hex::encode(sha2::Sha256::digest(&cert.der))
        );
        assert_eq!(
            cert.thumbprint_sha1_base64url,
            URL_SAFE_NO_PAD.encode(Sha1::digest(&cert.der))
        );
        assert_eq!(cert.thumbprint_sha1.len(), 40);
        assert_eq!(cert.thumbprint_sha256.len(), 64);
    }

    #[test]
    fn signature_verifies_over_tbs_bytes() {
        let (pair, cert) = demo_certificate();
        let (_, _, outer_content, _) = read_tlv(&cert.der);
        let (tbs_tag, tbs_whole, _, after_tbs) = read_tlv(outer_content);
        assert_eq!(tbs_tag, asn1::tag::SEQUENCE);
        let (_, _, _, after_alg) = read_tlv(after_tbs);
        let (sig_tag, _, sig_content, _) = read_tlv(after_alg);
        assert_eq!(sig_tag, asn1::tag::BIT_STRING);
        assert_eq!(sig_content[0], 0, "unused bits byte");

        let verifying_key = VerifyingKey::<Sha256>::new(pair.public_key.clone());
        let signature = rsa::pkcs1v15::Signature::try_from(&sig_content[1..]).unwrap();
        verifying_key.verify(tbs_whole, &signature).unwrap();
    }

    #[test]
    fn validity_window_matches_valid_days() {
        let pair = generate_rsa_key_pair().unwrap();
        let cert = create_self_signed_certificate(
            CertificateParams::new()
                .public_key_pem(&pair.public_key_pem)
                .private_key(&pair.private_key)
                .subject("CN=Short Lived".to_string())
                .valid_days(30)
                .build(),
        )
        .unwrap();
        assert_eq!(cert.not_after - cert.not_before, chrono::Duration::days(30));
        assert_eq!(cert.subject_dn, "CN=Short Lived");
    }

    #[test]
    fn serial_numbers_differ_between_generations() {
        let pair = generate_rsa_key_pair().unwrap();
        let params = || {
            CertificateParams::new()
                .public_key_pem(&pair.public_key_pem)
                .private_key(&pair.private_key)
                .build()
        };
        let a = create_self_signed_certificate(params()).unwrap();
        let b = create_self_signed_certificate(params()).unwrap();
        assert_ne!(a.serial_number, b.serial_number);
        assert_ne!(a.der, b.der);
    }

    #[test]
    fn pem_wraps_at_64_columns() {
        let (_, cert) = demo_certificate();
        assert!(cert.pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(cert.pem.ends_with("-----END CERTIFICATE-----\n"));
        for line in cert.pem.lines().filter(|l| !l.starts_with("-----")) {
            assert!(line.len() <= 64);
        }
    }

    #[test]
    fn mismatched_pem_is_an_error() {
        let pair = generate_rsa_key_pair().unwrap();
        let result = create_self_signed_certificate(
            CertificateParams::new()
                .public_key_pem("junk")
                .private_key(&pair.private_key)
                .build(),
        );
        assert!(result.is_err());
    }
}
