//! access token（JWT）検証 → Principal を request scope の context に入れる
//!
//! - `Authorization: Bearer <jwt>` を AuthPipeline に渡す
//! - 成功: context に Principal を入れたまま next を実行
//! - 失敗: 理由に関係なく同じ 401 (理由は pipeline がログに残す)
//! - store/codec の障害: 503
//! - skip path: pipeline を通さず、空の context で next を実行

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{Method, Request, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::services::auth::{AuthError, FailureHandler, Principal, SuccessHandler, context};
use crate::state::AppState;

/// `/api/v1/*` に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = middleware::auth::access::apply(api::v1::routes(), state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if state.skip.matches(original_uri.path()) {
        tracing::debug!(path = %original_uri.path(), "authentication skipped");
        return Ok(context::scope(next.run(req)).await);
    }

    let header = req.headers().get(header::AUTHORIZATION).cloned();
    let reject = Reject {
        method: req.method().clone(),
        uri: original_uri,
    };

    let response = state
        .auth
        .run(header.as_ref(), Forward { req, next }, reject)
        .await?;

    Ok(response)
}

/// Pass-through to the next processing stage.
struct Forward {
    req: Request<Body>,
    next: Next,
}

#[async_trait]
impl SuccessHandler for Forward {
    type Output = Response;

    async fn on_success(self, _principal: Arc<Principal>) -> Response {
        // middleware → handler へは context 経由で受け渡し
        self.next.run(self.req).await
    }
}

/// Uniform 401. The kind stays server-side.
struct Reject {
    method: Method,
    uri: Uri,
}

impl FailureHandler for Reject {
    type Output = Response;

    fn on_failure(self, error: AuthError) -> Response {
        tracing::info!(
            method = %self.method,
            path = %self.uri.path(),
            kind = error.kind(),
            "request rejected"
        );
        AppError::Unauthorized.into_response()
    }
}
