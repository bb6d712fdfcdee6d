use std::collections::BTreeSet;
use std::sync::Arc;

use crate::services::auth::codec::Claims;
use crate::services::auth::error::{AuthError, PipelineError};
use crate::services::auth::identity::{IdentityStore, Permission, RoleId};

/// Resolved identity for one request.
///
/// Immutable, and never holds an empty permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    permissions: BTreeSet<Permission>,
}

impl Principal {
    /// `None` when `permissions` is empty: zero authority is not an authenticated state.
    pub fn new(subject: impl Into<String>, permissions: BTreeSet<Permission>) -> Option<Self> {
        if permissions.is_empty() {
            return None;
        }
        Some(Self {
            subject: subject.into(),
            permissions,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }
}

/// Claims → Principal, using only the persisted role graph.
///
/// Role or authority claims carried by the token are ignored so that revocation
/// takes effect on the next request, not at token expiry.
#[derive(Clone)]
pub struct PrincipalResolver {
    store: Arc<dyn IdentityStore>,
}

impl PrincipalResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, claims: &Claims) -> Result<Principal, PipelineError> {
        let subject = claims.subject().ok_or(AuthError::MalformedClaims)?;

        let user = self
            .store
            .find_user_by_subject(subject)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::debug!(
            user_id = user.id,
            username = %user.username,
            roles = ?user.roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "user loaded"
        );

        let role_ids = ordered_role_ids(user.roles.iter().map(|r| r.id));
        if role_ids.is_empty() {
            return Err(AuthError::NoRolesAssigned.into());
        }

        let permissions = self.store.resolve_permissions(&role_ids).await?;

        let principal = Principal::new(subject, permissions).ok_or(AuthError::NoRolesAssigned)?;

        tracing::info!(
            subject = %principal.subject(),
            permissions = ?principal.permissions(),
            "principal resolved"
        );
        Ok(principal)
    }
}

// Dedup, first occurrence wins.
fn ordered_role_ids(ids: impl Iterator<Item = RoleId>) -> Vec<RoleId> {
    let mut seen = BTreeSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::error::AuthFault;
    use crate::services::auth::testing::{InMemoryIdentityStore, alice_store, perms};
    use serde_json::json;

    fn claims(value: serde_json::Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    fn resolver(store: &Arc<InMemoryIdentityStore>) -> PrincipalResolver {
        PrincipalResolver::new(store.clone())
    }

    #[test]
    fn principal_rejects_empty_permissions() {
        assert!(Principal::new("alice", BTreeSet::new()).is_none());
        let p = Principal::new("alice", perms(&["doc:read"])).unwrap();
        assert_eq!(p.subject(), "alice");
    }

    #[tokio::test]
    async fn permissions_are_union_of_roles_in_one_batch_call() {
        let store = Arc::new(alice_store());

        let principal = resolver(&store)
            .resolve(&claims(json!({ "sub": "alice" })))
            .await
            .unwrap();

        assert_eq!(principal.subject(), "alice");
        assert_eq!(principal.permissions(), &perms(&["doc:read", "doc:write"]));
        assert_eq!(store.user_lookups(), 1);
        assert_eq!(store.permission_lookups(), 1);
        assert_eq!(store.last_role_ids(), vec![RoleId(1), RoleId(2)]);
    }

    #[tokio::test]
    async fn token_authority_claims_are_ignored() {
        let store = Arc::new(alice_store());

        let principal = resolver(&store)
            .resolve(&claims(json!({
                "sub": "alice",
                "roles": ["ROLE_ADMIN"],
                "authorities": ["admin:all"],
                "scope": "admin:all"
            })))
            .await
            .unwrap();

        assert_eq!(principal.permissions(), &perms(&["doc:read", "doc:write"]));
    }

    #[tokio::test]
    async fn missing_or_non_string_subject_is_malformed_claims() {
        let store = Arc::new(alice_store());

        for value in [json!({}), json!({ "sub": 7 }), json!({ "subject": "alice" })] {
            let err = resolver(&store).resolve(&claims(value)).await.unwrap_err();
            assert!(
                matches!(err, PipelineError::Rejected(AuthError::MalformedClaims)),
                "{err:?}"
            );
        }
        assert_eq!(store.user_lookups(), 0);
    }

    #[tokio::test]
    async fn unknown_subject_is_user_not_found() {
        let store = Arc::new(alice_store());

        let err = resolver(&store)
            .resolve(&claims(json!({ "sub": "mallory" })))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Rejected(AuthError::UserNotFound)));
        assert_eq!(store.permission_lookups(), 0);
    }

    #[tokio::test]
    async fn user_without_roles_is_rejected_before_permission_lookup() {
        let store = Arc::new(InMemoryIdentityStore::new().with_user("bob", &[]));

        let err = resolver(&store)
            .resolve(&claims(json!({ "sub": "bob" })))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Rejected(AuthError::NoRolesAssigned)));
        assert_eq!(store.permission_lookups(), 0);
    }

    #[tokio::test]
    async fn roles_granting_nothing_count_as_no_roles() {
        let store = Arc::new(
            InMemoryIdentityStore::new()
                .with_role(9, &[])
                .with_user("carol", &[9]),
        );

        let err = resolver(&store)
            .resolve(&claims(json!({ "sub": "carol" })))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Rejected(AuthError::NoRolesAssigned)));
        assert_eq!(store.permission_lookups(), 1);
    }

    #[tokio::test]
    async fn duplicate_role_references_are_sent_once_in_order() {
        let store = Arc::new(
            InMemoryIdentityStore::new()
                .with_role(3, &["a"])
                .with_role(1, &["b"])
                .with_user("dave", &[3, 1, 3]),
        );

        resolver(&store)
            .resolve(&claims(json!({ "sub": "dave" })))
            .await
            .unwrap();

        assert_eq!(store.last_role_ids(), vec![RoleId(3), RoleId(1)]);
    }

    #[tokio::test]
    async fn store_failure_is_a_fault() {
        let store = Arc::new(alice_store());
        store.fail(true);

        let err = resolver(&store)
            .resolve(&claims(json!({ "sub": "alice" })))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Fault(AuthFault::Store(_))), "{err:?}");
    }
}
