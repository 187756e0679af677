//! The standard context initializer.

use fxrun_core::{
    BoxError, ContextInitializer, FunctionContext, InvocationCredentials, PlatformContext,
};
use thiserror::Error;
use tracing::debug;

/// Reasons [`SdkContextInitializer`] refuses to build a context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextInitError {
    /// Required members of the platform user context are empty.
    #[error("platform context is missing required fields: {}", .0.join(", "))]
    IncompleteUserContext(Vec<&'static str>),

    /// Required members of the credentials are empty.
    #[error("credentials are missing required fields: {}", .0.join(", "))]
    IncompleteCredentials(Vec<&'static str>),
}

/// Builds a [`FunctionContext`] for two-argument handlers.
///
/// Every required field of both context blocks must be non-empty. The
/// invocation id is the credentials' `functionInvocationId`, falling back to
/// the request id when the platform omits it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkContextInitializer;

impl SdkContextInitializer {
    fn check(
        credentials: &InvocationCredentials,
        platform: &PlatformContext,
    ) -> Result<(), ContextInitError> {
        let missing = platform.user_context.missing_fields();
        if !missing.is_empty() {
            return Err(ContextInitError::IncompleteUserContext(missing));
        }

        let missing: Vec<&'static str> = [
            ("accessToken", &credentials.access_token),
            ("functionName", &credentials.function_name),
            ("requestId", &credentials.request_id),
            ("resource", &credentials.resource),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(ContextInitError::IncompleteCredentials(missing));
        }
        Ok(())
    }
}

impl ContextInitializer for SdkContextInitializer {
    type Context = FunctionContext;

    async fn initialize(
        &self,
        credentials: &InvocationCredentials,
        platform: &PlatformContext,
    ) -> Result<FunctionContext, BoxError> {
        Self::check(credentials, platform)?;

        let invocation_id = credentials
            .function_invocation_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| credentials.request_id.clone());
        debug!(%invocation_id, org = %platform.user_context.org_id, "function context ready");

        Ok(FunctionContext::new(invocation_id, credentials, platform))
    }
}
