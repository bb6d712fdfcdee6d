//! Test fixtures: HS256 tokens and an in-memory identity store that counts its calls.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::HeaderValue;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::services::auth::codec::JwtCodec;
use crate::services::auth::identity::{IdentityStore, Permission, Role, RoleId, StoreError, User};
use crate::services::auth::token::{self, BearerToken};

pub const SECRET: &[u8] = b"test-only-hs256-secret";

pub fn hs256_codec() -> JwtCodec {
    JwtCodec::with_key(
        DecodingKey::from_secret(SECRET),
        Validation::new(Algorithm::HS256),
    )
}

pub fn sign(claims: serde_json::Value) -> String {
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
        .expect("sign test token")
}

/// Unix timestamp `minutes` from now (negative for the past).
pub fn in_minutes(minutes: i64) -> i64 {
    (chrono::Utc::now() + chrono::Duration::minutes(minutes)).timestamp()
}

pub fn bearer_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header")
}

pub fn bearer(token: &str) -> BearerToken {
    token::extract(Some(&bearer_header(token))).expect("well-formed bearer header")
}

pub fn perms(names: &[&str]) -> BTreeSet<Permission> {
    names.iter().map(|n| Permission::new(*n)).collect()
}

/// `alice` has roles [1, 2]; role 1 → {doc:read}, role 2 → {doc:write, doc:read}.
pub fn alice_store() -> InMemoryIdentityStore {
    InMemoryIdentityStore::new()
        .with_role(1, &["doc:read"])
        .with_role(2, &["doc:write", "doc:read"])
        .with_user("alice", &[1, 2])
}

#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: Mutex<HashMap<String, Vec<i64>>>,
    roles: HashMap<i64, Vec<String>>,
    failing: AtomicBool,
    user_lookups: AtomicUsize,
    permission_lookups: AtomicUsize,
    last_role_ids: Mutex<Vec<RoleId>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, id: i64, permissions: &[&str]) -> Self {
        self.roles
            .insert(id, permissions.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_user(self, username: &str, role_ids: &[i64]) -> Self {
        self.set_user_roles(username, role_ids);
        self
    }

    pub fn set_user_roles(&self, username: &str, role_ids: &[i64]) {
        self.users
            .lock()
            .unwrap()
            .insert(username.to_string(), role_ids.to_vec());
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn permission_lookups(&self) -> usize {
        self.permission_lookups.load(Ordering::SeqCst)
    }

    pub fn last_role_ids(&self) -> Vec<RoleId> {
        self.last_role_ids.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let users = self.users.lock().unwrap();
        let user = users
            .iter()
            .enumerate()
            .find(|(_, (name, _))| name.as_str() == subject)
            .map(|(idx, (name, role_ids))| User {
                id: idx as i64 + 1,
                username: name.clone(),
                roles: role_ids
                    .iter()
                    .map(|id| Role {
                        id: RoleId(*id),
                        name: format!("ROLE_{id}"),
                    })
                    .collect(),
            });
        Ok(user)
    }

    async fn resolve_permissions(
        &self,
        role_ids: &[RoleId],
    ) -> Result<BTreeSet<Permission>, StoreError> {
        self.permission_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        *self.last_role_ids.lock().unwrap() = role_ids.to_vec();

        Ok(role_ids
            .iter()
            .filter_map(|id| self.roles.get(&id.0))
            .flatten()
            .map(Permission::new)
            .collect())
    }
}
