/*
 * Responsibility
 * - GET /health (疎通用)
 * - /api/v1 の外にあるので認証 middleware を通らない
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
