//! # Marshalling Layer
//!
//! Four strategy families move data between event bytes and handler values,
//! selected by the handler's declared payload and return types:
//!
//! | Type | Strategy | Codec | Result media type |
//! |---|---|---|---|
//! | `bytes::Bytes` | [`Strategy::Raw`] | none | `application/octet-stream` |
//! | `String` | [`Strategy::Text`] | none | JSON |
//! | `Vec<T>` | [`Strategy::List`] | resolved for `T` | JSON |
//! | [`Json<T>`] | [`Strategy::Object`] | resolved for `T` | JSON |
//!
//! Strategies are bound to their codec once, when a handler is set up, by
//! [`Payload::unmarshaller`] and [`Output::marshaller`].

mod list;
mod object;
mod raw;
mod text;

pub use list::{ListMarshaller, ListUnmarshaller};
pub use object::{Json, JsonMarshaller, JsonUnmarshaller};
pub use raw::{RawMarshaller, RawUnmarshaller};
pub use text::{TextMarshaller, TextUnmarshaller};

use crate::registry::CodecRegistry;
use fxrun_core::{
    AmbiguousCodecError, EventEnvelope, InvocationResult, MarshalError, Shape, UnmarshalError,
};

/// The strategy family of a bound (un)marshaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Bytes passed through untouched.
    Raw,
    /// UTF-8 text.
    Text,
    /// A JSON array of a homogeneous element shape.
    List,
    /// A structured value as JSON.
    Object,
}

/// Turns event data into a payload value.
pub trait PayloadUnmarshaller<P>: Send + Sync {
    /// The strategy family.
    fn strategy(&self) -> Strategy;

    /// Whether the event must declare JSON content and carry non-empty data.
    fn requires_json(&self) -> bool;

    /// Converts the envelope's data.
    fn unmarshal(&self, envelope: &EventEnvelope) -> Result<P, UnmarshalError>;
}

/// Turns a handler's return value into a result.
pub trait ResultMarshaller<O>: Send + Sync {
    /// The strategy family.
    fn strategy(&self) -> Strategy;

    /// Converts the value.
    fn marshal(&self, value: O) -> Result<InvocationResult, MarshalError>;
}

/// A type a handler may accept as its payload.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a function payload",
    label = "not a payload type",
    note = "Payloads are `bytes::Bytes`, `String`, `Vec<T>` or `Json<T>`."
)]
pub trait Payload: Shape + Send + Sized {
    /// Binds the unmarshaller for this type.
    fn unmarshaller(
        registry: &CodecRegistry,
    ) -> Result<Box<dyn PayloadUnmarshaller<Self>>, AmbiguousCodecError>;
}

/// A type a handler may return.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a function",
    label = "not a result type",
    note = "Results are `bytes::Bytes`, `String`, `Vec<T>` or `Json<T>`."
)]
pub trait Output: Shape + Send + Sized {
    /// Binds the marshaller for this type.
    fn marshaller(
        registry: &CodecRegistry,
    ) -> Result<Box<dyn ResultMarshaller<Self>>, AmbiguousCodecError>;
}

fn data_of(envelope: &EventEnvelope) -> &[u8] {
    envelope.data().map(|b| &b[..]).unwrap_or_default()
}
