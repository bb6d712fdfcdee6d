/*
 * Responsibility
 * - users / roles / permissions テーブル向け SQLx 操作 (read only)
 * - PgIdentityStore: IdentityStore の Postgres 実装
 *
 * Tables (owned by the identity store, not created here)
 * - users(id BIGINT, username TEXT)
 * - roles(id BIGINT, name TEXT)
 * - user_roles(user_id BIGINT, role_id BIGINT)
 * - permissions(id BIGINT, name TEXT)
 * - role_permissions(role_id BIGINT, permission_id BIGINT)
 */
use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;
use crate::services::auth::{IdentityStore, Permission, Role, RoleId, StoreError, User};

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
}

pub async fn find_user_by_username(
    db: &PgPool,
    username: &str,
) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username
        FROM users
        WHERE username = $1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn list_roles_for_user(db: &PgPool, user_id: i64) -> Result<Vec<RoleRow>, RepoError> {
    let rows = sqlx::query_as::<_, RoleRow>(
        r#"
        SELECT r.id, r.name
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = $1
        ORDER BY r.id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Permission names granted by any of `role_ids`, in one query.
pub async fn permissions_for_roles(
    db: &PgPool,
    role_ids: &[i64],
) -> Result<Vec<String>, RepoError> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT p.name
        FROM role_permissions rp
        JOIN permissions p ON p.id = rp.permission_id
        WHERE rp.role_id = ANY($1)
        ORDER BY p.name
        "#,
    )
    .bind(role_ids)
    .fetch_all(db)
    .await?;

    Ok(names)
}

#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    db: PgPool,
}

impl PgIdentityStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        let Some(user) = find_user_by_username(&self.db, subject)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let roles = list_roles_for_user(&self.db, user.id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|r| Role {
                id: RoleId(r.id),
                name: r.name,
            })
            .collect();

        Ok(Some(User {
            id: user.id,
            username: user.username,
            roles,
        }))
    }

    async fn resolve_permissions(
        &self,
        role_ids: &[RoleId],
    ) -> Result<BTreeSet<Permission>, StoreError> {
        let ids: Vec<i64> = role_ids.iter().map(|id| id.0).collect();

        let names = permissions_for_roles(&self.db, &ids)
            .await
            .map_err(store_error)?;

        Ok(names.into_iter().map(Permission::new).collect())
    }
}

// Connectivity problems are transient; anything else is reported as-is.
fn store_error(e: RepoError) -> StoreError {
    match e {
        RepoError::Db(
            db_err @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)),
        ) => StoreError::Unavailable(db_err.to_string()),
        other => StoreError::Repo(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_errors_are_unavailable() {
        let err = store_error(RepoError::Db(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.to_string().contains("pool timed out"), "{err}");

        let err = store_error(RepoError::Db(sqlx::Error::RowNotFound));
        assert!(matches!(err, StoreError::Repo(_)));
    }
}
