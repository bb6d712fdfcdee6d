//! Request-scoped authentication context.
//!
//! Each request runs inside [`scope`], which gives the task a fresh, empty slot.
//! The slot is dropped when the scoped future finishes *or is dropped*, so a
//! principal can never be observed by a later request (or by a cancelled one's successor).
//! Interleaved futures on the same task (`join!`) each see their own slot.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::services::auth::principal::Principal;

tokio::task_local! {
    static CURRENT: RefCell<Option<Arc<Principal>>>;
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("authentication context used outside of a request scope")]
    OutOfScope,
}

/// Run `fut` with an empty authentication context.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    CURRENT.scope(RefCell::new(None), fut).await
}

/// Bind `principal` to the current request, replacing any previous binding.
pub fn install(principal: Arc<Principal>) -> Result<(), ContextError> {
    CURRENT
        .try_with(|slot| {
            slot.replace(Some(principal));
        })
        .map_err(|_| ContextError::OutOfScope)
}

/// The principal bound to the current request, if any.
pub fn current() -> Option<Arc<Principal>> {
    CURRENT.try_with(|slot| slot.borrow().clone()).ok().flatten()
}

/// Unbind unconditionally. No-op outside a scope.
pub fn clear() {
    let _ = CURRENT.try_with(|slot| slot.replace(None));
}
