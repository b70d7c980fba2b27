//! Claim extraction from the backend's bearer token.
//!
//! The console never holds the signing key, so the payload is read without
//! verifying the signature; the backend remains the one that enforces it.
//! Claim names issued by the backend have varied between releases, so each
//! identity field is looked up through an ordered list of candidate keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::models::{Identity, Role};

pub type Claims = Map<String, Value>;

/// Candidate claim names for the user id, most preferred first.
pub const USER_ID_CLAIMS: &[&str] = &["EmployeeId", "employeeId"];
/// Candidate claim names for the role, most preferred first.
pub const ROLE_CLAIMS: &[&str] = &["Role", "role"];
/// Candidate claim names for the username, most preferred first.
pub const USERNAME_CLAIMS: &[&str] = &["sub", "username", "unique_name"];

/// Reads the claims payload, the second `.`-separated segment. The header
/// and signature are not inspected. A missing segment, bad base64url or a
/// payload that is not a JSON object yields `None`.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.trim().split('.').nth(1)?;
    // tolerate padded and standard-alphabet encoders
    let payload: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()
}

/// First candidate present with a usable value. Null and blank strings count
/// as absent so the next candidate gets its turn.
pub fn first_claim<'a>(claims: &'a Claims, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|key| match claims.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(value) => Some(value),
    })
}

pub fn identity_from_claims(claims: &Claims) -> Identity {
    let user_id = first_claim(claims, USER_ID_CLAIMS).and_then(|value| match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    });
    let username = first_claim(claims, USERNAME_CLAIMS)
        .and_then(Value::as_str)
        .map(str::to_owned);
    let role = first_claim(claims, ROLE_CLAIMS)
        .and_then(Value::as_str)
        .and_then(|value| value.parse::<Role>().ok());

    Identity {
        user_id,
        username,
        role,
    }
}

/// Identity carried by `token`, or `None` when it cannot be decoded.
pub fn parse_identity(token: &str) -> Option<Identity> {
    decode_claims(token).map(|claims| identity_from_claims(&claims))
}
