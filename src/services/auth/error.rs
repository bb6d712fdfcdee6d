use thiserror::Error;

use crate::services::auth::context::ContextError;
use crate::services::auth::identity::StoreError;

/// Reasons a request is not authenticated.
///
/// Every kind is handled the same way (context cleared, failure handler invoked).
/// The kind is for logs only and must never reach the client verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingToken,
    #[error("authorization header is malformed")]
    MalformedToken,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is expired")]
    TokenExpired,
    #[error("token claims are malformed")]
    MalformedClaims,
    #[error("user not found")]
    UserNotFound,
    #[error("user has no granted authority")]
    NoRolesAssigned,
}

impl AuthError {
    /// Stable identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MalformedToken => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::MalformedClaims => "malformed_claims",
            Self::UserNotFound => "user_not_found",
            Self::NoRolesAssigned => "no_roles_assigned",
        }
    }
}

/// Failures that are not an authentication decision (backend down, misconfiguration).
///
/// The transport layer classifies these (503) instead of answering 401.
#[derive(Debug, Error)]
pub enum AuthFault {
    #[error("identity store failure: {0}")]
    Store(#[from] StoreError),
    #[error("token codec failure: {0}")]
    Codec(String),
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Terminal failure of one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Rejected(#[from] AuthError),
    #[error(transparent)]
    Fault(#[from] AuthFault),
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        Self::Fault(AuthFault::Store(e))
    }
}
