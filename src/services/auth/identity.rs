//! Identity store contract: users, their roles, and role → permission resolution.
//!
//! The store is the trust-of-record for authority. It is read-only from the
//! pipeline's point of view and must tolerate concurrent reads.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    // Ordered as the store returns them
    pub roles: Vec<Role>,
}

/// Granted capability, e.g. `doc:read`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// First user whose username equals `subject`, with its roles.
    async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError>;

    /// Deduplicated union of the permissions granted by `role_ids`.
    ///
    /// One round-trip regardless of how many roles are passed.
    async fn resolve_permissions(
        &self,
        role_ids: &[RoleId],
    ) -> Result<BTreeSet<Permission>, StoreError>;
}
