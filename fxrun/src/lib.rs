//! # fxrun - Function Invocation Host
//!
//! `fxrun` takes one inbound invocation event, decodes the platform context
//! carried beside it, unmarshals the payload with the codec chosen for the
//! handler's declared types, runs the handler, and hands back either a
//! transport-ready result or one classified failure.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fxrun::prelude::*;
//!
//! #[fxrun::function]
//! async fn upper(text: String) -> Result<String, BoxError> {
//!     Ok(text.to_uppercase())
//! }
//!
//! let registry = CodecRegistry::default();
//! let descriptor = HandlerDescriptor::builder(upper).build(&registry)?;
//!
//! let result = descriptor.apply(&envelope).await?;
//! assert_eq!(&result.body()[..], br#""TEST MESSAGE""#);
//! ```
//!
//! ## Structured payloads
//!
//! ```rust,ignore
//! #[derive(Shape, Serialize, Deserialize)]
//! #[shape(binding = "camel_case")]
//! struct Order { order_id: String }
//!
//! #[fxrun::function]
//! async fn accept(order: Json<Order>, ctx: FunctionContext) -> Result<Json<Order>, BoxError> {
//!     Ok(order)
//! }
//!
//! let descriptor = HandlerDescriptor::builder(accept)
//!     .initializer(SdkContextInitializer)
//!     .build(&registry)?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

extern crate self as fxrun;

mod config;
mod descriptor;
mod invoker;
mod pipeline;
mod scope;

pub use config::{ContentTypePolicy, PipelineConfig, PipelineConfigBuilder};
pub use descriptor::{HandlerDescriptor, HandlerDescriptorBuilder};
pub use invoker::{DynInvoker, FunctionRegistry, FunctionRegistryBuilder, InvocationFuture};
pub use pipeline::InvocationPipeline;
pub use scope::RequestScope;

pub use fxrun_core::{
    // Errors
    AmbiguousCodecError,
    BoxError,
    // Codecs
    Codec,
    CodecError,
    // Context
    ContextInitializer,
    ContextFnHandler,
    ErrorCategory,
    // Envelope
    EventEnvelope,
    EnvelopeBuilder,
    EnvelopeError,
    ExtensionValue,
    FailureKind,
    FnHandler,
    FunctionContext,
    // Handler
    Handler,
    HandlerFailure,
    InvocationCredentials,
    InvocationError,
    // Result
    InvocationResult,
    MarshalError,
    NoContext,
    Org,
    PlatformContext,
    // Shapes
    Layout,
    Shape,
    ShapeInfo,
    UnmarshalError,
    User,
    UserContext,
    Variant,
    context_handler_fn,
    handler_fn,
};

/// Protocol constants.
pub mod protocol {
    pub use fxrun_core::{
        CREDENTIALS_EXTENSION, JSON_MEDIA_TYPE, LEGACY_PROBE_TYPE, OCTET_STREAM_MEDIA_TYPE,
        PLATFORM_CONTEXT_EXTENSION, SYNC_INVOKE_TYPE, TRACE_PARENT_EXTENSION,
    };
}

pub use fxrun_std::{
    CodecRegistry, CodecRegistryBuilder, ContextInitError, Json, KeyCase, KeyCaseCodec, Output,
    Payload, SdkContextInitializer, SerdeJsonCodec, Strategy,
};

/// Context extension decoding.
pub mod decoder {
    pub use fxrun_std::decoder::{
        decode_credentials, decode_extension, decode_platform_context, decode_structured,
        encode_extension,
    };
}

/// Marshalling strategies.
pub mod marshal {
    #![allow(clippy::wildcard_imports)]
    pub use fxrun_std::marshal::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use fxrun_std::testing::*;
}

/// Prelude module - common imports for fxrun.
///
/// # Usage
///
/// ```rust,ignore
/// use fxrun::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, CodecRegistry, EventEnvelope, FunctionContext, Handler, HandlerDescriptor,
        InvocationError, InvocationPipeline, InvocationResult, Json, SdkContextInitializer, Shape,
    };

    #[cfg(feature = "macros")]
    pub use crate::function;
}

#[cfg(feature = "macros")]
pub use fxrun_macros::{Shape, function};

#[cfg(feature = "inventory")]
pub use fxrun_std::CodecRegistration;

#[cfg(feature = "inventory")]
pub use inventory;
