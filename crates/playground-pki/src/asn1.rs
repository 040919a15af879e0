//! Minimal DER encoder.
//!
//! Covers exactly the structures a self-signed certificate is made of:
//! INTEGER, BIT STRING, NULL, OBJECT IDENTIFIER, UTF8String, UTCTime,
//! SEQUENCE, SET, and the `[0] EXPLICIT` version wrapper. This is an
//! encoder only; parsing stays out of scope.

use chrono::{DateTime, Utc};

use crate::error::{PkiError, Result};

/// DER tag bytes used by the certificate encoder.
pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const UTF8_STRING: u8 = 0x0c;
    pub const UTC_TIME: u8 = 0x17;
    pub const SEQUENCE: u8 = 0x30;
    pub const SET: u8 = 0x31;
    /// Context-specific `[0]`, constructed.
    pub const CONTEXT_0: u8 = 0xa0;
}

/// sha256WithRSAEncryption
pub const OID_SHA256_WITH_RSA: &[u64] = &[1, 2, 840, 113549, 1, 1, 11];

const OID_AT_COMMON_NAME: &[u64] = &[2, 5, 4, 3];
const OID_AT_ORGANIZATION: &[u64] = &[2, 5, 4, 10];
const OID_AT_COUNTRY: &[u64] = &[2, 5, 4, 6];

/// Generic tag-length-value. Short-form length below 128 bytes, long-form
/// (length-of-length byte with the high bit set) above.
pub fn encode(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 4);
    out.push(tag);
    encode_length(content.len(), &mut out);
    out.extend_from_slice(content);
    out
}

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        out.push(0x80 | (bytes.len() - first) as u8);
        out.extend_from_slice(&bytes[first..]);
    }
}

/// Unsigned big-endian magnitude as a DER INTEGER: minimal content bytes,
/// with a leading zero byte when the high bit would read as a sign.
pub fn encode_integer(magnitude: &[u8]) -> Vec<u8> {
    let first = magnitude.iter().position(|&b| b != 0);
    let trimmed = match first {
        Some(i) => &magnitude[i..],
        None => &[0u8][..],
    };
    let mut content = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        content.push(0);
    }
    content.extend_from_slice(trimmed);
    encode(tag::INTEGER, &content)
}

pub fn encode_sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    encode(tag::SEQUENCE, &parts.concat())
}

pub fn encode_set(parts: &[Vec<u8>]) -> Vec<u8> {
    encode(tag::SET, &parts.concat())
}

pub fn encode_null() -> Vec<u8> {
    encode(tag::NULL, &[])
}

pub fn encode_utf8_string(value: &str) -> Vec<u8> {
    encode(tag::UTF8_STRING, value.as_bytes())
}

/// BIT STRING with zero unused bits.
pub fn encode_bit_string(bits: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(bits.len() + 1);
    content.push(0);
    content.extend_from_slice(bits);
    encode(tag::BIT_STRING, &content)
}

/// OBJECT IDENTIFIER from its integer arcs.
pub fn encode_oid(arcs: &[u64]) -> Result<Vec<u8>> {
    if arcs.len() < 2 {
        return Err(PkiError::Asn1(format!(
            "OID needs at least two arcs, got {}",
            arcs.len()
        )));
    }
    if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
        return Err(PkiError::Asn1(format!(
            "invalid OID root arcs {}.{}",
            arcs[0], arcs[1]
        )));
    }
    let mut content = Vec::new();
    push_base128(arcs[0] * 40 + arcs[1], &mut content);
    for &arc in &arcs[2..] {
        push_base128(arc, &mut content);
    }
    Ok(encode(tag::OBJECT_IDENTIFIER, &content))
}

fn push_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut stack = [0u8; 10];
    let mut i = 0;
    loop {
        stack[i] = (value & 0x7f) as u8;
        value >>= 7;
        i += 1;
        if value == 0 {
            break;
        }
    }
    while i > 1 {
        i -= 1;
        out.push(stack[i] | 0x80);
    }
    out.push(stack[0]);
}

/// `YYMMDDHHMMSSZ`.
///
/// UTCTime carries a two-digit year and is only well-defined through 2049;
/// this encoder does not switch to GeneralizedTime past that point, matching
/// the playground's original behavior.
pub fn encode_utc_time(at: &DateTime<Utc>) -> Vec<u8> {
    let formatted = at.format("%y%m%d%H%M%SZ").to_string();
    encode(tag::UTC_TIME, formatted.as_bytes())
}

/// X.501 Name from a comma-separated `ATTR=value` string.
///
/// CN, O, and C are recognized; anything else (including a bare value with
/// no `=`) falls back to CN. Output is SEQUENCE of SET of
/// SEQUENCE { OID, UTF8String }, one RDN per attribute.
pub fn encode_distinguished_name(dn: &str) -> Result<Vec<u8>> {
    let mut rdns = Vec::new();
    for part in dn.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (attr, value) = match part.split_once('=') {
            Some((attr, value)) => (attr.trim(), value.trim()),
            None => ("CN", part),
        };
        let oid = match attr.to_ascii_uppercase().as_str() {
            "O" => OID_AT_ORGANIZATION,
            "C" => OID_AT_COUNTRY,
            _ => OID_AT_COMMON_NAME,
        };
        let attribute = encode_sequence(&[encode_oid(oid)?, encode_utf8_string(value)]);
        rdns.push(encode_set(&[attribute]));
    }
    Ok(encode_sequence(&rdns))
}
