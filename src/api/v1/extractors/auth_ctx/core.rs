use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{Principal, context};

/// Handler で Principal を受け取るための extractor
/// access middleware が context に install 済みである前提
/// 見つからない場合は 401 を返す（skip path・ミドルウェア未設定）
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Arc<Principal>);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context::current()
            .map(CurrentPrincipal)
            .ok_or(AppError::Unauthorized)
    }
}
