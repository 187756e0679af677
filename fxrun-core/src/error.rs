//! Error types for fxrun.
//!
//! The taxonomy is split by the moment a failure can happen:
//!
//! - [`InvocationError`] - request-time failures returned by the pipeline
//! - [`AmbiguousCodecError`] - setup-time failure; a handler whose shapes it
//!   names is never registered
//! - [`CodecError`], [`UnmarshalError`], [`MarshalError`] - causes wrapped by
//!   the request-time variants
//! - [`HandlerFailure`] - an error returned, or a panic raised, by handler code

use std::{any::Any, backtrace::Backtrace, fmt};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Who a failure is attributable to.
///
/// Transports map categories to status codes; the exact table is theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller sent something the function cannot accept (4xx).
    Caller,
    /// The handler's own logic failed.
    Handler,
    /// The host or its environment failed (5xx).
    Internal,
}

/// A request-time failure of the invocation pipeline.
///
/// Every step of the pipeline either advances or terminates with exactly one
/// of these variants. None of them are retried by the pipeline.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The event `type` is not an accepted invocation type.
    #[error("incompatible event type: {event_type}")]
    IncompatibleEventType {
        /// The rejected event type.
        event_type: String,
    },

    /// The event content type does not suit the bound payload strategy.
    #[error("incompatible data content type: {}", content_type.as_deref().unwrap_or("<none>"))]
    IncompatibleDataContentType {
        /// The rejected content type, if any was sent.
        content_type: Option<String>,
    },

    /// The event carries no data but the payload strategy needs some.
    #[error("event has no data")]
    MissingEventData,

    /// The `sfcontext` extension is absent or cannot be decoded.
    #[error("platform context extension is missing or malformed")]
    MalformedOrMissingPlatformContext,

    /// The `sffncontext` extension is absent or cannot be decoded.
    #[error("credentials extension is missing or malformed")]
    MalformedOrMissingCredentials,

    /// The payload could not be converted to the handler's payload type.
    #[error("payload unmarshalling failed: {0}")]
    PayloadUnmarshalling(#[source] BoxError),

    /// The handler context could not be initialized.
    #[error("sdk initialization failed: {0}")]
    SdkInitialization(#[source] BoxError),

    /// The handler body returned an error or panicked.
    #[error("handler threw: {0}")]
    HandlerThrewException(#[source] HandlerFailure),

    /// The handler's return value could not be marshalled.
    #[error("result marshalling failed: {0}")]
    ResultMarshalling(#[source] BoxError),

    /// Invocation plumbing failed outside the handler body.
    #[error("internal invocation error: {message}")]
    InternalInvocation {
        /// Description of what went wrong.
        message: String,
    },
}

impl InvocationError {
    /// Returns who the failure is attributable to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            InvocationError::IncompatibleEventType { .. }
            | InvocationError::IncompatibleDataContentType { .. }
            | InvocationError::MissingEventData
            | InvocationError::MalformedOrMissingPlatformContext
            | InvocationError::MalformedOrMissingCredentials
            | InvocationError::PayloadUnmarshalling(_) => ErrorCategory::Caller,
            InvocationError::HandlerThrewException(_) => ErrorCategory::Handler,
            InvocationError::SdkInitialization(_)
            | InvocationError::ResultMarshalling(_)
            | InvocationError::InternalInvocation { .. } => ErrorCategory::Internal,
        }
    }

    /// A stable, machine-readable name for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            InvocationError::IncompatibleEventType { .. } => "IncompatibleEventType",
            InvocationError::IncompatibleDataContentType { .. } => "IncompatibleDataContentType",
            InvocationError::MissingEventData => "MissingEventData",
            InvocationError::MalformedOrMissingPlatformContext => {
                "MalformedOrMissingPlatformContext"
            }
            InvocationError::MalformedOrMissingCredentials => "MalformedOrMissingCredentials",
            InvocationError::PayloadUnmarshalling(_) => "PayloadUnmarshallingError",
            InvocationError::SdkInitialization(_) => "SdkInitializationError",
            InvocationError::HandlerThrewException(_) => "HandlerThrewException",
            InvocationError::ResultMarshalling(_) => "ResultMarshallingError",
            InvocationError::InternalInvocation { .. } => "InternalInvocationError",
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        InvocationError::InternalInvocation {
            message: message.into(),
        }
    }

    /// Builds an [`InvocationError::InternalInvocation`] from a caught panic.
    pub fn from_panic(stage: &str, payload: Box<dyn Any + Send>) -> Self {
        Self::internal(format!("{stage} panicked: {}", panic_message(&*payload)))
    }
}

/// More than one codec claims a shape.
///
/// Raised while a handler is being set up, never while serving a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("shape `{shape}` is claimed by more than one codec: {}", codecs.join(", "))]
pub struct AmbiguousCodecError {
    /// Type name of the ambiguous shape.
    pub shape: &'static str,
    /// Names of every codec that claimed it, in registration order.
    pub codecs: Vec<&'static str>,
}

/// Errors raised by a [`Codec`](crate::Codec).
#[derive(Error, Debug)]
pub enum CodecError {
    /// The text is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Well-formed JSON that does not fit the target shape.
    #[error("JSON does not match `{shape}`: {source}")]
    Mismatch {
        /// Target type name.
        shape: &'static str,
        /// Underlying deserializer error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be turned into JSON.
    #[error("`{shape}` cannot be encoded: {source}")]
    Encode {
        /// Source type name.
        shape: &'static str,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while turning event data into a payload value.
#[derive(Error, Debug)]
pub enum UnmarshalError {
    /// The data is not valid UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The codec rejected the data.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A JSON value of the wrong kind was found.
    #[error("expected a JSON {expected}, found {found}")]
    UnexpectedJson {
        /// Kind the strategy needs.
        expected: &'static str,
        /// Kind actually present.
        found: &'static str,
    },

    /// One element of a list payload did not fit the element shape.
    #[error("list element {index}: {source}")]
    Element {
        /// Zero-based position in the array.
        index: usize,
        /// Codec failure for that element.
        #[source]
        source: CodecError,
    },
}

/// Errors raised while turning a handler's return value into a result.
#[derive(Error, Debug)]
pub enum MarshalError {
    /// The codec rejected the value.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// One element of a list return value could not be encoded.
    #[error("list element {index}: {source}")]
    Element {
        /// Zero-based position in the list.
        index: usize,
        /// Codec failure for that element.
        #[source]
        source: CodecError,
    },
}

/// How the handler body failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The handler returned an `Err`.
    Returned,
    /// The handler panicked.
    Panicked,
}

/// An error returned, or a panic raised, by the handler body itself.
///
/// The original error stays reachable through [`std::error::Error::source`]
/// and [`HandlerFailure::downcast_ref`]. The backtrace is captured by the
/// pipeline after the handler future returned or unwound, so it shows where
/// the failure was classified, not the handler's own frames. A trace from
/// inside the handler survives only if the returned error carries one in its
/// `source()` chain; for panics the process panic hook prints the panic-site
/// trace. Capture is only enabled by `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE`.
pub struct HandlerFailure {
    kind: FailureKind,
    message: String,
    source: Option<BoxError>,
    backtrace: Backtrace,
}

impl HandlerFailure {
    /// Wraps an error returned by the handler.
    pub fn returned(error: BoxError) -> Self {
        Self {
            kind: FailureKind::Returned,
            message: error.to_string(),
            source: Some(error),
            backtrace: Backtrace::capture(),
        }
    }

    /// Wraps the payload of a panic caught around the handler.
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        Self {
            kind: FailureKind::Panicked,
            message: panic_message(&*payload),
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    /// How the handler failed.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The handler's error message, or the panic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backtrace of the classifying call site, not of the handler.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Attempts to view the original error as a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref().and_then(|e| e.downcast_ref::<E>())
    }
}

impl fmt::Debug for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFailure")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Returned => f.write_str(&self.message),
            FailureKind::Panicked => write!(f, "panicked: {}", self.message),
        }
    }
}

impl std::error::Error for HandlerFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
