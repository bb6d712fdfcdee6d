/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストの Principal を handler に提供する
 * - 値そのものは middleware が request scope の context に install 済み
 */

mod core;

pub use core::CurrentPrincipal;
