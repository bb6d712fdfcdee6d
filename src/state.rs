/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: 認証パイプライン, skip: 認証を通さない path
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト間で可変な状態は持たない
 */
use std::sync::Arc;

use crate::middleware::auth::skip::SkipMatcher;
use crate::services::auth::AuthPipeline;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthPipeline>,
    pub skip: Arc<SkipMatcher>,
}

impl AppState {
    pub fn new(auth: Arc<AuthPipeline>, skip: SkipMatcher) -> Self {
        Self {
            auth,
            skip: Arc::new(skip),
        }
    }
}
