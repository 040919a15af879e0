//! Compact JWS assembly for RS256 tokens.

pub mod jws;
pub mod jwt;
pub mod signing;

pub use self::signing::create_signed_jwt;
