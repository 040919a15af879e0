//! Unverified decoding of compact JWTs, for display only.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;

/// Pretty-printed header and payload of a compact JWT.
///
/// Produced without any signature check; purely presentational and must not
/// be mistaken for verification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DecodedToken {
    pub header: String,
    pub payload: String,
}

/// Decode a compact JWT's header and payload for display.
///
/// Any malformed input yields empty strings rather than an error.
pub fn decode(token: &str) -> DecodedToken {
    match decode_parts(token) {
        Some((header, payload)) => DecodedToken {
            header: serde_json::to_string_pretty(&header).unwrap_or_default(),
            payload: serde_json::to_string_pretty(&payload).unwrap_or_default(),
        },
        None => DecodedToken::default(),
    }
}

/// Split a compact JWT and parse its first two sections as JSON.
pub(crate) fn decode_parts(token: &str) -> Option<(serde_json::Value, serde_json::Value)> {
    let mut sections = token.split('.');
    let header = sections.next()?;
    let payload = sections.next()?;
    sections.next()?;
    if sections.next().is_some() {
        return None;
    }
    let header = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header).ok()?).ok()?;
    let payload = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
    Some((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn fake_jwt(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decodes_header_and_payload() {
        let token = fake_jwt(r#"{"alg":"RS256","kid":"a"}"#, r#"{"iss":"https://idp"}"#);
        let decoded = decode(&token);
        assert!(decoded.header.contains("\"alg\": \"RS256\""));
        assert!(decoded.payload.contains("\"iss\": \"https://idp\""));
    }

    #[test]
    fn malformed_inputs_yield_empty_strings() {
        for bad in [
            "",
            "only-one-part",
            "two.parts",
            "a.b.c.d",
            "!!!.###.sig",
            &fake_jwt("not json", r#"{"ok":true}"#),
        ] {
            assert_eq!(decode(bad), DecodedToken::default(), "input: {bad:?}");
        }
    }

    #[test]
    fn decode_never_panics_on_non_utf8_payload() {
        let token = format!("e30.{}.c2ln", URL_SAFE_NO_PAD.encode([0xff, 0xfe]));
        assert_eq!(decode(&token), DecodedToken::default());
    }
}
