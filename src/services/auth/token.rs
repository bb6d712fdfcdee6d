//! `Authorization: Bearer <token>` header parsing.
//!
//! Only the header shape is checked here. Signature/expiry belong to the codec.

use std::fmt;

use axum::http::HeaderValue;

use crate::services::auth::error::AuthError;

const SCHEME: &str = "bearer";

/// Candidate credential pulled out of the header. Lives for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the credential itself.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

/// Extract the token from the raw `Authorization` header value.
///
/// - absent / blank header → `MissingToken`
/// - non-visible-ASCII header, other scheme, empty or non-b64token credential → `MalformedToken`
///
/// The scheme name is case-insensitive (RFC 7235).
pub fn extract(header: Option<&HeaderValue>) -> Result<BearerToken, AuthError> {
    let Some(header) = header else {
        return Err(AuthError::MissingToken);
    };
    if header.as_bytes().iter().all(u8::is_ascii_whitespace) {
        return Err(AuthError::MissingToken);
    }

    let raw = header.to_str().map_err(|_| AuthError::MalformedToken)?.trim();

    let (scheme, credential) = raw.split_once(' ').ok_or(AuthError::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(AuthError::MalformedToken);
    }

    let credential = credential.trim_start();
    if !is_b64token(credential) {
        return Err(AuthError::MalformedToken);
    }

    Ok(BearerToken(credential.to_string()))
}

// b64token = 1*( ALPHA / DIGIT / "-" / "." / "_" / "~" / "+" / "/" ) *"="  (RFC 6750)
fn is_b64token(s: &str) -> bool {
    let body = s.trim_end_matches('=');
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'+' | b'/'))
}
