//! # Handlers
//!
//! The terminal point of an invocation: user code that receives the
//! unmarshalled payload (and, for two-argument handlers, a context object)
//! and returns a value to be marshalled.
//!
//! # Usage Patterns
//!
//! 1. **Closure**: `handler_fn(|name: String| async move { Ok::<_, BoxError>(name) })`
//! 2. **Closure with context**: `context_handler_fn(|p: Json<Order>, ctx: FunctionContext| ...)`
//! 3. **Struct implementation**: `impl Handler for MyFunction`
//! 4. **Attribute macro**: `#[fxrun::function]` on an `async fn`

use crate::error::BoxError;
use std::{future::Future, marker::PhantomData};

/// A function body the host can invoke.
///
/// An `Err` returned from [`Handler::call`] is reported as
/// `HandlerThrewException`, as is a panic raised while the call runs.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a function `Handler`",
    label = "missing `Handler` implementation",
    note = "Wrap closures with `handler_fn` or `context_handler_fn`, or use `#[fxrun::function]`."
)]
pub trait Handler: Send + Sync + 'static {
    /// The payload type; selects the unmarshalling strategy.
    type Payload: Send + 'static;

    /// The context type; `()` for payload-only handlers.
    type Context: Send + 'static;

    /// The return type; selects the marshalling strategy.
    type Output: Send + 'static;

    /// Runs the function body.
    fn call(
        &self,
        payload: Self::Payload,
        context: Self::Context,
    ) -> impl Future<Output = Result<Self::Output, BoxError>> + Send;
}

/// A payload-only handler built from a closure. See [`handler_fn`].
pub struct FnHandler<F, P> {
    func: F,
    _marker: PhantomData<fn(P)>,
}

/// Wraps `func(payload)` as a [`Handler`] whose context is `()`.
pub fn handler_fn<F, P, Fut, O, E>(func: F) -> FnHandler<F, P>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
{
    FnHandler {
        func,
        _marker: PhantomData,
    }
}

impl<F, P, Fut, O, E> Handler for FnHandler<F, P>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    P: Send + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
    O: Send + 'static,
    E: Into<BoxError>,
{
    type Payload = P;
    type Context = ();
    type Output = O;

    async fn call(&self, payload: P, _context: ()) -> Result<O, BoxError> {
        (self.func)(payload).await.map_err(Into::into)
    }
}

/// A handler taking payload and context, built from a closure.
/// See [`context_handler_fn`].
pub struct ContextFnHandler<F, P, C> {
    func: F,
    _marker: PhantomData<fn(P, C)>,
}

/// Wraps `func(payload, context)` as a [`Handler`].
pub fn context_handler_fn<F, P, C, Fut, O, E>(func: F) -> ContextFnHandler<F, P, C>
where
    F: Fn(P, C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
{
    ContextFnHandler {
        func,
        _marker: PhantomData,
    }
}

impl<F, P, C, Fut, O, E> Handler for ContextFnHandler<F, P, C>
where
    F: Fn(P, C) -> Fut + Send + Sync + 'static,
    P: Send + 'static,
    C: Send + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
    O: Send + 'static,
    E: Into<BoxError>,
{
    type Payload = P;
    type Context = C;
    type Output = O;

    async fn call(&self, payload: P, context: C) -> Result<O, BoxError> {
        (self.func)(payload, context).await.map_err(Into::into)
    }
}
