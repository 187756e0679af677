//! The JSON codec contract.
//!
//! A [`Codec`] turns JSON text into a [`serde_json::Value`] tree and back,
//! applying its own conventions on the way. The target [`ShapeInfo`] is
//! passed along so a codec can tell field names from data. Typed conversion happens on top
//! of the tree through serde, via [`decode_as`](trait.Codec.html#method.decode_as)
//! and [`encode_from`](trait.Codec.html#method.encode_from) on `dyn Codec`.

use crate::{
    error::CodecError,
    shape::{Shape, ShapeInfo},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::any::type_name;

/// A pluggable JSON (de)serialization strategy.
pub trait Codec: Send + Sync + 'static {
    /// Name used in logs and ambiguity reports.
    fn name(&self) -> &'static str;

    /// The binding marker this codec owns, if any.
    ///
    /// A codec without a binding can only ever be used as the fallback.
    fn binding(&self) -> Option<&'static str>;

    /// Whether this codec must be used for `shape`.
    fn applies_to(&self, shape: &ShapeInfo) -> bool {
        self.binding().is_some_and(|b| shape.declares(b))
    }

    /// Parses JSON text into a value tree destined for `shape`.
    fn decode(&self, json: &str, shape: &ShapeInfo) -> Result<Value, CodecError>;

    /// Renders a value tree of `shape` as JSON text.
    fn encode(&self, value: Value, shape: &ShapeInfo) -> Result<String, CodecError>;
}

impl dyn Codec {
    /// Parses JSON text straight into `T`.
    pub fn decode_as<T: DeserializeOwned + Shape>(&self, json: &str) -> Result<T, CodecError> {
        let value = self.decode(json, &T::shape())?;
        Self::from_value(value)
    }

    /// Converts an already decoded tree into `T`.
    pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
        serde_json::from_value(value).map_err(|source| CodecError::Mismatch {
            shape: type_name::<T>(),
            source,
        })
    }

    /// Renders `value` as JSON text.
    pub fn encode_from<T: Serialize + Shape>(&self, value: &T) -> Result<String, CodecError> {
        let tree = Self::to_value(value)?;
        self.encode(tree, &T::shape())
    }

    /// Converts `value` into a tree without rendering it.
    pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, CodecError> {
        serde_json::to_value(value).map_err(|source| CodecError::Encode {
            shape: type_name::<T>(),
            source,
        })
    }
}

/// Short name of a JSON value's kind, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Codec for Plain {
        fn name(&self) -> &'static str {
            "plain"
        }

        fn binding(&self) -> Option<&'static str> {
            Some("plain")
        }

        fn decode(&self, json: &str, _shape: &ShapeInfo) -> Result<Value, CodecError> {
            serde_json::from_str(json).map_err(CodecError::Syntax)
        }

        fn encode(&self, value: Value, _shape: &ShapeInfo) -> Result<String, CodecError> {
            Ok(value.to_string())
        }
    }

    #[test]
    fn test_typed_helpers() {
        let codec: &dyn Codec = &Plain;
        let numbers: Vec<u32> = codec.decode_as("[1, 2, 3]").unwrap();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(codec.encode_from(&numbers).unwrap(), "[1,2,3]");
    }

    #[test]
    fn test_mismatch_names_target() {
        let codec: &dyn Codec = &Plain;
        let err = codec.decode_as::<Vec<u32>>(r#"{"a": 1}"#).unwrap_err();
        assert!(matches!(err, CodecError::Mismatch { shape, .. } if shape.contains("Vec<u32>")));
    }

    #[test]
    fn test_default_applies_to_uses_binding() {
        assert!(!Plain.applies_to(&String::shape()));
    }
}
