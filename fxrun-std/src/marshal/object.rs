use super::{Output, Payload, PayloadUnmarshaller, ResultMarshaller, Strategy, data_of};
use crate::registry::CodecRegistry;
use fxrun_core::{
    AmbiguousCodecError, Codec, EventEnvelope, InvocationResult, Layout, MarshalError, Shape,
    ShapeInfo, UnmarshalError,
};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// A structured payload or result carried as JSON.
///
/// ```rust,ignore
/// #[fxrun::function]
/// async fn total(order: Json<Order>) -> Result<Json<Receipt>, BoxError> {
///     Ok(Json(Receipt::for_order(&order)))
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}

impl<T: Shape> Shape for Json<T> {
    fn shape() -> ShapeInfo {
        ShapeInfo::new::<Self>(&[], || vec![T::shape()]).with_layout(Layout::Transparent)
    }
}

/// Decodes the payload into `T` with the codec resolved for `T`.
pub struct JsonUnmarshaller<T> {
    codec: Arc<dyn Codec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonUnmarshaller<T> {
    /// Binds to `codec`.
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            _marker: PhantomData,
        }
    }

    /// The bound codec.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }
}

impl<T: Shape + DeserializeOwned> PayloadUnmarshaller<Json<T>> for JsonUnmarshaller<T> {
    fn strategy(&self) -> Strategy {
        Strategy::Object
    }

    fn requires_json(&self) -> bool {
        true
    }

    fn unmarshal(&self, envelope: &EventEnvelope) -> Result<Json<T>, UnmarshalError> {
        let text = std::str::from_utf8(data_of(envelope))?;
        Ok(Json(self.codec.decode_as(text)?))
    }
}

/// Encodes `T` with the codec resolved for `T`.
pub struct JsonMarshaller<T> {
    codec: Arc<dyn Codec>,
    _marker: PhantomData<fn(T)>,
}

impl<T> JsonMarshaller<T> {
    /// Binds to `codec`.
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            _marker: PhantomData,
        }
    }

    /// The bound codec.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }
}

impl<T: Shape + Serialize> ResultMarshaller<Json<T>> for JsonMarshaller<T> {
    fn strategy(&self) -> Strategy {
        Strategy::Object
    }

    fn marshal(&self, value: Json<T>) -> Result<InvocationResult, MarshalError> {
        let text = self.codec.encode_from(&value.0)?;
        Ok(InvocationResult::json(text))
    }
}

impl<T> Payload for Json<T>
where
    T: Shape + DeserializeOwned + Send,
{
    fn unmarshaller(
        registry: &CodecRegistry,
    ) -> Result<Box<dyn PayloadUnmarshaller<Self>>, AmbiguousCodecError> {
        let codec = registry.resolve(&T::shape())?;
        Ok(Box::new(JsonUnmarshaller::<T>::new(codec)))
    }
}

impl<T> Output for Json<T>
where
    T: Shape + Serialize + Send,
{
    fn marshaller(
        registry: &CodecRegistry,
    ) -> Result<Box<dyn ResultMarshaller<Self>>, AmbiguousCodecError> {
        let codec = registry.resolve(&T::shape())?;
        Ok(Box::new(JsonMarshaller::<T>::new(codec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::KeyCaseCodec;
    use fxrun_core::{CodecError, SYNC_INVOKE_TYPE};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Invoice {
        invoice_number: String,
        amount_due: f64,
    }

    impl Shape for Invoice {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&["kebab_case"], &["invoice_number", "amount_due"], || {
                vec![String::shape(), f64::shape()]
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Plain {
        name: String,
    }

    impl Shape for Plain {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&[], &["name"], || vec![String::shape()])
        }
    }

    fn envelope(data: impl Into<bytes::Bytes>) -> EventEnvelope {
        EventEnvelope::builder("1", "urn:x", SYNC_INVOKE_TYPE)
            .data_content_type("application/json")
            .data(data)
            .build()
            .unwrap()
    }

    #[test]
    fn test_object_selects_bound_codec() {
        let registry = CodecRegistry::default();
        let unmarshaller = Json::<Invoice>::unmarshaller(&registry).unwrap();
        assert_eq!(unmarshaller.strategy(), Strategy::Object);

        let invoice = unmarshaller
            .unmarshal(&envelope(&br#"{"invoice-number": "INV-9", "amount-due": 12.5}"#[..]))
            .unwrap();
        assert_eq!(invoice.invoice_number, "INV-9");
        assert_eq!(invoice.amount_due, 12.5);
    }

    #[test]
    fn test_unbound_shape_uses_fallback() {
        let registry = CodecRegistry::default();
        let marshaller = Json::<Plain>::marshaller(&registry).unwrap();
        let result = marshaller
            .marshal(Json(Plain {
                name: "Acme".into(),
            }))
            .unwrap();
        assert_eq!(&result.body()[..], br#"{"name":"Acme"}"#);
    }

    #[test]
    fn test_mismatch_is_codec_error() {
        let unmarshaller = JsonUnmarshaller::<Plain>::new(Arc::new(KeyCaseCodec::camel_case()));
        let err = unmarshaller.unmarshal(&envelope(&b"[1]"[..])).unwrap_err();
        assert!(matches!(err, UnmarshalError::Codec(CodecError::Mismatch { .. })));
    }

    #[test]
    fn test_roundtrip_preserves_value() {
        let codec: Arc<dyn Codec> = Arc::new(KeyCaseCodec::kebab_case());
        let original = Invoice {
            invoice_number: "INV-1".into(),
            amount_due: 99.0,
        };

        let result = JsonMarshaller::<Invoice>::new(Arc::clone(&codec))
            .marshal(Json(original.clone()))
            .unwrap();
        let back = JsonUnmarshaller::<Invoice>::new(codec)
            .unmarshal(&envelope(result.body().clone()))
            .unwrap();
        assert_eq!(back.into_inner(), original);
    }
}
