//! Key and certificate material for the OAuth playground.
//!
//! Everything here is deliberately ephemeral: key pairs and certificates are
//! generated on demand, held in memory by the caller, and never persisted.
//! The DER encoder in [`asn1`] covers exactly the structures a self-signed
//! X.509v3 certificate needs and nothing more (no extensions, no CRLs).

pub mod asn1;
pub mod cert;
pub mod error;
pub mod keys;
pub mod random;

pub use cert::{Certificate, CertificateParams, create_self_signed_certificate};
pub use error::{PkiError, Result};
pub use keys::{KeyPair, generate_rsa_key_pair};
