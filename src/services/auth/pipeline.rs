/*
 * Responsibility
 * - 認証パイプライン: extract → decode → resolve → context install → success/failure dispatch
 * - 失敗は最初の一つだけを記録し、以降のステップは実行しない (retry なし)
 * - どの出口でも context は scope 終了と共に消える
 */
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderValue;

use crate::services::auth::codec::TokenCodec;
use crate::services::auth::context;
use crate::services::auth::error::{AuthError, AuthFault, PipelineError};
use crate::services::auth::identity::IdentityStore;
use crate::services::auth::principal::{Principal, PrincipalResolver};
use crate::services::auth::token;

/// Progress of one run. A failure is reported together with the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extracted,
    Decoded,
    Resolved,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Extracted => "extracted",
            Self::Decoded => "decoded",
            Self::Resolved => "resolved",
        })
    }
}

/// Invoked once the principal is installed; typically forwards to the next stage.
#[async_trait]
pub trait SuccessHandler: Send {
    type Output: Send;

    async fn on_success(self, principal: Arc<Principal>) -> Self::Output;
}

/// Invoked with the recorded kind after the context has been cleared.
/// Responsible for the client-visible response; must not echo the kind.
pub trait FailureHandler: Send {
    type Output;

    fn on_failure(self, error: AuthError) -> Self::Output;
}

#[derive(Clone)]
pub struct AuthPipeline {
    codec: Arc<dyn TokenCodec>,
    resolver: PrincipalResolver,
}

impl fmt::Debug for AuthPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPipeline").finish_non_exhaustive()
    }
}

impl AuthPipeline {
    pub fn new(codec: Arc<dyn TokenCodec>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            codec,
            resolver: PrincipalResolver::new(store),
        }
    }

    /// Header → Principal without touching the context.
    pub async fn authenticate(
        &self,
        header: Option<&HeaderValue>,
    ) -> Result<Principal, PipelineError> {
        let mut stage = Stage::Start;
        let result = self.advance(header, &mut stage).await;

        match &result {
            Ok(principal) => {
                tracing::debug!(%stage, subject = %principal.subject(), "authentication succeeded");
            }
            Err(PipelineError::Rejected(err)) => {
                tracing::warn!(%stage, kind = err.kind(), "authentication failed");
            }
            Err(PipelineError::Fault(fault)) => {
                tracing::error!(%stage, error = %fault, "authentication aborted by backend fault");
            }
        }

        result
    }

    async fn advance(
        &self,
        header: Option<&HeaderValue>,
        stage: &mut Stage,
    ) -> Result<Principal, PipelineError> {
        let token = token::extract(header)?;
        *stage = Stage::Extracted;
        tracing::debug!(%stage, "bearer token extracted");

        let claims = self.codec.decode(&token).await?;
        *stage = Stage::Decoded;
        tracing::debug!(%stage, "token decoded");

        let principal = self.resolver.resolve(&claims).await?;
        *stage = Stage::Resolved;

        Ok(principal)
    }

    /// Full run inside a fresh context scope.
    ///
    /// - success: principal installed, `on_success` runs with it visible through `context::current()`
    /// - rejection: context cleared, `on_failure` receives the kind
    /// - fault: context cleared, `Err` for the transport to classify (neither handler runs)
    pub async fn run<S, F>(
        &self,
        header: Option<&HeaderValue>,
        on_success: S,
        on_failure: F,
    ) -> Result<S::Output, AuthFault>
    where
        S: SuccessHandler,
        F: FailureHandler<Output = S::Output>,
    {
        context::scope(async move {
            match self.authenticate(header).await {
                Ok(principal) => {
                    let principal = Arc::new(principal);
                    if let Err(err) = context::install(principal.clone()) {
                        return Err(AuthFault::from(err));
                    }
                    Ok(on_success.on_success(principal).await)
                }
                Err(PipelineError::Rejected(error)) => {
                    context::clear();
                    Ok(on_failure.on_failure(error))
                }
                Err(PipelineError::Fault(fault)) => {
                    context::clear();
                    Err(fault)
                }
            }
        })
        .await
    }
}
