//! # Invocation Pipeline
//!
//! One linear pass per request. Each step either advances or ends the
//! invocation with exactly one [`InvocationError`]:
//!
//! 1. event type is accepted
//! 2. content type is JSON, when the payload strategy needs it
//! 3. data is present, when the payload strategy needs it
//! 4. `sfcontext` and `sffncontext` decode
//! 5. payload unmarshals
//! 6. context initializes and the handler runs
//! 7. handler errors and panics become `HandlerThrewException`
//! 8. the return value marshals
//! 9. the [`InvocationResult`] is returned
//!
//! A panic outside the handler body is reported as `InternalInvocationError`.

use crate::{descriptor::HandlerDescriptor, scope::RequestScope};
use futures::FutureExt;
use fxrun_core::{
    ContextInitializer, ErrorCategory, EventEnvelope, Handler, HandlerFailure, InvocationError,
    InvocationResult,
};
use fxrun_std::{
    Output, Payload,
    decoder::{decode_credentials, decode_platform_context},
};
use std::{future::Future, panic::AssertUnwindSafe};
use tracing::{Instrument, debug, error, info, warn};

/// Runs invocations against one bound handler.
///
/// For dynamic dispatch (e.g. in a [`FunctionRegistry`]), use
/// [`DynInvoker`].
///
/// [`FunctionRegistry`]: crate::FunctionRegistry
/// [`DynInvoker`]: crate::DynInvoker
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `InvocationPipeline`",
    label = "missing `InvocationPipeline` implementation",
    note = "Build a `HandlerDescriptor` for your handler."
)]
pub trait InvocationPipeline: Send + Sync + 'static {
    /// The function name.
    fn name(&self) -> &str;

    /// Processes one envelope.
    fn apply(
        &self,
        envelope: &EventEnvelope,
    ) -> impl Future<Output = Result<InvocationResult, InvocationError>> + Send;
}

impl<H, I> InvocationPipeline for HandlerDescriptor<H, I>
where
    H: Handler<Context = I::Context>,
    H::Payload: Payload,
    H::Output: Output,
    I: ContextInitializer,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, envelope: &EventEnvelope) -> Result<InvocationResult, InvocationError> {
        let scope = RequestScope::new(&self.name, envelope);
        let outcome = self
            .run(envelope, &scope)
            .instrument(scope.span().clone())
            .await;

        match &outcome {
            Ok(result) => info!(
                parent: scope.span(),
                media_type = result.media_type(),
                body_len = result.body().len(),
                "invocation succeeded"
            ),
            Err(err) => match err.category() {
                ErrorCategory::Caller => {
                    warn!(
                        parent: scope.span(),
                        kind = err.kind(),
                        error = %err,
                        "invocation rejected"
                    )
                }
                ErrorCategory::Handler | ErrorCategory::Internal => {
                    error!(
                        parent: scope.span(),
                        kind = err.kind(),
                        error = %err,
                        "invocation failed"
                    )
                }
            },
        }
        outcome
    }
}

impl<H, I> HandlerDescriptor<H, I>
where
    H: Handler<Context = I::Context>,
    H::Payload: Payload,
    H::Output: Output,
    I: ContextInitializer,
{
    async fn run(
        &self,
        envelope: &EventEnvelope,
        scope: &RequestScope,
    ) -> Result<InvocationResult, InvocationError> {
        // 1. protocol
        if !self.config.accepts(envelope.event_type()) {
            return Err(InvocationError::IncompatibleEventType {
                event_type: envelope.event_type().to_string(),
            });
        }

        // 2-3. content and data
        let requires_json = self
            .config
            .content_type_policy()
            .requires_json(self.unmarshaller.requires_json());
        if requires_json {
            if !envelope.is_json() {
                return Err(InvocationError::IncompatibleDataContentType {
                    content_type: envelope.data_content_type().map(str::to_string),
                });
            }
            if envelope.data().is_none_or(|data| data.is_empty()) {
                return Err(InvocationError::MissingEventData);
            }
        }
        debug!(parent: scope.span(), requires_json, "envelope accepted");

        // 4. context
        let platform = decode_platform_context(envelope)
            .ok_or(InvocationError::MalformedOrMissingPlatformContext)?;
        let credentials =
            decode_credentials(envelope).ok_or(InvocationError::MalformedOrMissingCredentials)?;
        scope.record_credentials(&credentials);
        debug!(parent: scope.span(), api_version = %platform.api_version, "context decoded");

        // 5. payload
        let payload =
            std::panic::catch_unwind(AssertUnwindSafe(|| self.unmarshaller.unmarshal(envelope)))
                .map_err(|panic| InvocationError::from_panic("payload unmarshalling", panic))?
                .map_err(|err| InvocationError::PayloadUnmarshalling(Box::new(err)))?;
        debug!(
            parent: scope.span(),
            strategy = ?self.unmarshaller.strategy(),
            "payload unmarshalled"
        );

        // 6. context initialization
        let context = AssertUnwindSafe(self.initializer.initialize(&credentials, &platform))
            .catch_unwind()
            .await
            .map_err(|panic| InvocationError::from_panic("context initialization", panic))?
            .map_err(InvocationError::SdkInitialization)?;

        // 6-7. dispatch
        let output = match AssertUnwindSafe(self.handler.call(payload, context))
            .catch_unwind()
            .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(InvocationError::HandlerThrewException(HandlerFailure::returned(err)));
            }
            Err(panic) => {
                return Err(InvocationError::HandlerThrewException(HandlerFailure::panicked(panic)));
            }
        };
        debug!(parent: scope.span(), "handler returned");

        // 8-9. result
        std::panic::catch_unwind(AssertUnwindSafe(|| self.marshaller.marshal(output)))
            .map_err(|panic| InvocationError::from_panic("result marshalling", panic))?
            .map_err(|err| InvocationError::ResultMarshalling(Box::new(err)))
    }
}
