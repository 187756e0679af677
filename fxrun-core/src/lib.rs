//! # fxrun-core
//!
//! Core contracts for the fxrun function invocation host.
//!
//! This crate has minimal dependencies and is meant to be imported by codec
//! providers, context initializers and handler crates that do not need the
//! standard implementations in `fxrun-std`.
//!
//! # Contents
//!
//! - [`EventEnvelope`] - one inbound invocation event
//! - [`PlatformContext`], [`InvocationCredentials`] - the decoded context
//!   extensions
//! - [`Shape`] - compile-time declaration of which codec owns a type
//! - [`Codec`] - a JSON (de)serialization strategy
//! - [`Handler`], [`ContextInitializer`] - the user-code seam
//! - [`InvocationResult`] - what a successful invocation produces
//!
//! # Error Types
//!
//! - [`InvocationError`] - request-time failures
//! - [`AmbiguousCodecError`] - setup-time codec conflicts
//! - [`HandlerFailure`] - handler errors and panics

#![deny(clippy::wildcard_imports)]

mod codec;
mod context;
mod envelope;
mod error;
mod handler;
mod result;
mod shape;

pub use codec::{Codec, json_kind};
pub use context::{
    ContextInitializer, FunctionContext, InvocationCredentials, NoContext, Org, PlatformContext,
    User, UserContext,
};
pub use envelope::{
    CREDENTIALS_EXTENSION, EnvelopeBuilder, EnvelopeError, EventEnvelope, ExtensionValue,
    LEGACY_PROBE_TYPE, PLATFORM_CONTEXT_EXTENSION, SYNC_INVOKE_TYPE, TRACE_PARENT_EXTENSION,
};
pub use error::{
    AmbiguousCodecError, BoxError, CodecError, ErrorCategory, FailureKind, HandlerFailure,
    InvocationError, MarshalError, UnmarshalError,
};
pub use handler::{ContextFnHandler, FnHandler, Handler, context_handler_fn, handler_fn};
pub use result::{InvocationResult, JSON_MEDIA_TYPE, OCTET_STREAM_MEDIA_TYPE};
pub use shape::{Layout, Shape, ShapeInfo, Variant};
