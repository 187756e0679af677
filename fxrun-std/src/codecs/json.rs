use fxrun_core::{Codec, CodecError, ShapeInfo};
use serde_json::Value;

/// Plain `serde_json` text to value conversion.
///
/// Shapes with no codec markers resolve to this codec. Field naming follows
/// whatever the shape's own serde attributes say. It declares no binding, so
/// it is only ever chosen as the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonCodec;

impl Codec for SerdeJsonCodec {
    fn name(&self) -> &'static str {
        "serde_json"
    }

    fn binding(&self) -> Option<&'static str> {
        None
    }

    fn decode(&self, json: &str, _shape: &ShapeInfo) -> Result<Value, CodecError> {
        serde_json::from_str(json).map_err(CodecError::Syntax)
    }

    fn encode(&self, value: Value, _shape: &ShapeInfo) -> Result<String, CodecError> {
        serde_json::to_string(&value).map_err(|source| CodecError::Encode {
            shape: "serde_json::Value",
            source,
        })
    }
}
