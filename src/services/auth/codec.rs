use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::services::auth::error::{AuthError, AuthFault, PipelineError};
use crate::services::auth::token::BearerToken;

/// Decoded token payload (claim name → value).
///
/// Only `sub` is read by the pipeline. Authority claims such as `roles`/`scope`
/// are carried but never consulted: the identity store is the only source of permissions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// The `sub` claim if present and a string.
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    // Backend/misconfiguration; not the caller's fault.
    #[error("codec unavailable: {0}")]
    Unavailable(String),
}

impl From<DecodeError> for PipelineError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::InvalidSignature => AuthError::InvalidSignature.into(),
            DecodeError::Expired => AuthError::TokenExpired.into(),
            DecodeError::Malformed => AuthError::MalformedToken.into(),
            DecodeError::Unavailable(reason) => AuthFault::Codec(reason).into(),
        }
    }
}

/// Turns a bearer token into verified claims.
///
/// Implementations must check signature and expiry together: claims are only
/// returned when both hold.
#[async_trait]
pub trait TokenCodec: Send + Sync {
    async fn decode(&self, token: &BearerToken) -> Result<Claims, DecodeError>;
}

/// JWT access-token codec.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtCodec {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtCodec {
    /// EdDSA (Ed25519) verifier with issuer/audience pinned.
    pub fn from_ed_pem(
        public_key_pem: &str,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Result<Self, String> {
        let decoding_key = DecodingKey::from_ed_pem(public_key_pem.as_bytes())
            .map_err(|e| format!("invalid ed25519 public key pem: {}", e))?;

        let validation = pinned(
            Validation::new(Algorithm::EdDSA),
            issuer,
            audience,
            leeway_seconds,
        );

        Ok(Self::with_key(decoding_key, validation))
    }

    /// Any key/validation pair. `exp` is always required and checked.
    pub fn with_key(decoding_key: DecodingKey, mut validation: Validation) -> Self {
        validation.validate_exp = true;
        validation.required_spec_claims.insert("exp".to_string());

        Self {
            decoding_key,
            validation,
        }
    }

    fn verify(&self, token: &str) -> Result<Claims, DecodeError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))
    }
}

#[async_trait]
impl TokenCodec for JwtCodec {
    async fn decode(&self, token: &BearerToken) -> Result<Claims, DecodeError> {
        self.verify(token.as_str())
    }
}

// `set_issuer`/`set_audience` only compare when the claim is present,
// so both are also required.
fn pinned(
    mut validation: Validation,
    issuer: &str,
    audience: &str,
    leeway_seconds: u64,
) -> Validation {
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.leeway = leeway_seconds;
    validation
}

fn classify(kind: &ErrorKind) -> DecodeError {
    match kind {
        ErrorKind::InvalidSignature => DecodeError::InvalidSignature,
        ErrorKind::ExpiredSignature => DecodeError::Expired,
        ErrorKind::InvalidKeyFormat => {
            DecodeError::Unavailable("decoding key rejected by verifier".to_string())
        }
        // base64/json/utf8 damage, wrong alg, nbf, iss/aud mismatch, missing exp/iss/aud
        _ => DecodeError::Malformed,
    }
}
