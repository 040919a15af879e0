use serde::{Deserialize, Serialize};

pub const ALG_RS256: &str = "RS256";

/// Protected header for an RS256 compact JWS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// base64url SHA-1 certificate thumbprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    /// base64url SHA-256 certificate thumbprint
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "x5t#S256")]
    pub x5ts256: Option<String>,
}

impl Header {
    pub fn rs256() -> Self {
        Self {
            alg: ALG_RS256.to_string(),
            typ: Some("JWT".to_string()),
            kid: None,
            x5t: None,
            x5ts256: None,
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::rs256()
    }
}
