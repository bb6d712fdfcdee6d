/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - Bearer 認証は app.rs で v1 全体に掛ける (skip path は config で指定)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::me::me;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
