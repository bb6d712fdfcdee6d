/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: Bearer 認証, http: request-id / trace / timeout / body limit
 */
pub mod auth;
pub mod http;
