//! Bearer authentication: token → claims → principal → request-scoped context.

pub mod codec;
pub mod context;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod principal;
pub mod token;

#[cfg(test)]
pub mod testing;

pub use codec::JwtCodec;
pub use error::{AuthError, AuthFault};
pub use identity::{IdentityStore, Permission, Role, RoleId, StoreError, User};
pub use pipeline::{AuthPipeline, FailureHandler, SuccessHandler};
pub use principal::Principal;
