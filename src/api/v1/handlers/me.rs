/*
 * Responsibility
 * - GET /me: 現在の Principal (subject + permissions) を返す
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::CurrentPrincipal};

pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<MeResponse> {
    Json(MeResponse::from(principal.as_ref()))
}
