use super::{Output, Payload, PayloadUnmarshaller, ResultMarshaller, Strategy, data_of};
use crate::registry::CodecRegistry;
use fxrun_core::{
    AmbiguousCodecError, Codec, EventEnvelope, InvocationResult, MarshalError, Shape,
    UnmarshalError, json_kind,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{marker::PhantomData, sync::Arc};

/// Reads a JSON array into `Vec<T>` through the codec resolved for the list.
///
/// Elements are converted one by one so a failure names its index.
pub struct ListUnmarshaller<T> {
    codec: Arc<dyn Codec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ListUnmarshaller<T> {
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

impl<T: Shape + DeserializeOwned> PayloadUnmarshaller<Vec<T>> for ListUnmarshaller<T> {
    fn strategy(&self) -> Strategy {
        Strategy::List
    }

    fn requires_json(&self) -> bool {
        true
    }

    fn unmarshal(&self, envelope: &EventEnvelope) -> Result<Vec<T>, UnmarshalError> {
        let text = std::str::from_utf8(data_of(envelope))?;
        match self.codec.decode(text, &Vec::<T>::shape())? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    <dyn Codec>::from_value(item)
                        .map_err(|source| UnmarshalError::Element { index, source })
                })
                .collect(),
            other => Err(UnmarshalError::UnexpectedJson {
                expected: "array",
                found: json_kind(&other),
            }),
        }
    }
}

/// Writes `Vec<T>` as a JSON array.
pub struct ListMarshaller<T> {
    codec: Arc<dyn Codec>,
    _marker: PhantomData<fn(T)>,
}

impl<T> ListMarshaller<T> {
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

impl<T: Shape + Serialize> ResultMarshaller<Vec<T>> for ListMarshaller<T> {
    fn strategy(&self) -> Strategy {
        Strategy::List
    }

    fn marshal(&self, value: Vec<T>) -> Result<InvocationResult, MarshalError> {
        let items = value
            .iter()
            .enumerate()
            .map(|(index, item)| {
                <dyn Codec>::to_value(item)
                    .map_err(|source| MarshalError::Element { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let text = self.codec.encode(Value::Array(items), &Vec::<T>::shape())?;
        Ok(InvocationResult::json(text))
    }
}

impl<T> Payload for Vec<T>
where
    T: Shape + DeserializeOwned + Send,
{
    fn unmarshaller(
        registry: &CodecRegistry,
    ) -> Result<Box<dyn PayloadUnmarshaller<Self>>, AmbiguousCodecError> {
        let codec = registry.resolve(&Self::shape())?;
        Ok(Box::new(ListUnmarshaller::<T>::new(codec)))
    }
}

impl<T> Output for Vec<T>
where
    T: Shape + Serialize + Send,
{
    fn marshaller(
        registry: &CodecRegistry,
    ) -> Result<Box<dyn ResultMarshaller<Self>>, AmbiguousCodecError> {
        let codec = registry.resolve(&Self::shape())?;
        Ok(Box::new(ListMarshaller::<T>::new(codec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{KeyCaseCodec, SerdeJsonCodec};
    use fxrun_core::{SYNC_INVOKE_TYPE, ShapeInfo};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LineItem {
        sku_code: String,
        unit_count: u32,
    }

    impl Shape for LineItem {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&["camel_case"], &["sku_code", "unit_count"], || {
                vec![String::shape(), u32::shape()]
            })
        }
    }

    fn envelope(data: &'static [u8]) -> EventEnvelope {
        EventEnvelope::builder("1", "urn:x", SYNC_INVOKE_TYPE)
            .data_content_type("application/json")
            .data(data)
            .build()
            .unwrap()
    }

    #[test]
    fn test_list_uses_element_codec() {
        let registry = CodecRegistry::default();
        let unmarshaller = Vec::<LineItem>::unmarshaller(&registry).unwrap();
        assert_eq!(unmarshaller.strategy(), Strategy::List);
        assert!(unmarshaller.requires_json());

        let items = unmarshaller
            .unmarshal(&envelope(br#"[{"skuCode": "A-1", "unitCount": 2}]"#))
            .unwrap();
        assert_eq!(
            items,
            vec![LineItem {
                sku_code: "A-1".into(),
                unit_count: 2
            }]
        );
    }

    #[test]
    fn test_non_array_rejected() {
        let unmarshaller = ListUnmarshaller::<u32>::new(Arc::new(SerdeJsonCodec));
        let err = unmarshaller.unmarshal(&envelope(br#"{"a": 1}"#)).unwrap_err();
        assert!(matches!(
            err,
            UnmarshalError::UnexpectedJson { expected: "array", found: "object" }
        ));
    }

    #[test]
    fn test_bad_element_reports_index() {
        let unmarshaller = ListUnmarshaller::<u32>::new(Arc::new(SerdeJsonCodec));
        let err = unmarshaller.unmarshal(&envelope(br#"[1, 2, "three"]"#)).unwrap_err();
        assert!(matches!(err, UnmarshalError::Element { index: 2, .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let unmarshaller = ListUnmarshaller::<u32>::new(Arc::new(SerdeJsonCodec));
        let err = unmarshaller.unmarshal(&envelope(b"[1, 2")).unwrap_err();
        assert!(matches!(err, UnmarshalError::Codec(_)));
    }

    #[test]
    fn test_list_result_roundtrip() {
        let marshaller = ListMarshaller::<LineItem>::new(Arc::new(KeyCaseCodec::camel_case()));
        let items = vec![LineItem {
            sku_code: "B-7".into(),
            unit_count: 5,
        }];
        let result = marshaller.marshal(items).unwrap();
        assert_eq!(result.media_type(), "application/json; charset=utf-8");
        assert_eq!(&result.body()[..], br#"[{"skuCode":"B-7","unitCount":5}]"#);

        let unmarshaller = ListUnmarshaller::<LineItem>::new(Arc::new(KeyCaseCodec::camel_case()));
        let back = EventEnvelope::builder("2", "urn:x", SYNC_INVOKE_TYPE)
            .data_content_type("application/json")
            .data(result.body().clone())
            .build()
            .unwrap();
        assert_eq!(unmarshaller.unmarshal(&back).unwrap()[0].sku_code, "B-7");
    }
}
