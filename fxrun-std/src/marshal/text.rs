use super::{Output, Payload, PayloadUnmarshaller, ResultMarshaller, Strategy, data_of};
use crate::registry::CodecRegistry;
use fxrun_core::{
    AmbiguousCodecError, CodecError, EventEnvelope, InvocationResult, MarshalError,
    UnmarshalError,
};

/// Reads the payload as text.
///
/// JSON content holding a single JSON string is unquoted. Everything else,
/// including JSON content that is not a JSON string, is taken as raw UTF-8.
/// Absent data becomes `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextUnmarshaller;

impl PayloadUnmarshaller<String> for TextUnmarshaller {
    fn strategy(&self) -> Strategy {
        Strategy::Text
    }

    fn requires_json(&self) -> bool {
        false
    }

    fn unmarshal(&self, envelope: &EventEnvelope) -> Result<String, UnmarshalError> {
        let data = data_of(envelope);
        if data.is_empty() {
            return Ok(String::new());
        }
        let text = std::str::from_utf8(data)?;
        let unquoted = envelope
            .is_json()
            .then(|| serde_json::from_str::<String>(text).ok())
            .flatten();
        Ok(unquoted.unwrap_or_else(|| text.to_string()))
    }
}

/// Returns text as a quoted JSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMarshaller;

impl ResultMarshaller<String> for TextMarshaller {
    fn strategy(&self) -> Strategy {
        Strategy::Text
    }

    fn marshal(&self, value: String) -> Result<InvocationResult, MarshalError> {
        let quoted = serde_json::to_string(&value).map_err(|source| CodecError::Encode {
            shape: "String",
            source,
        })?;
        Ok(InvocationResult::json(quoted))
    }
}

impl Payload for String {
    fn unmarshaller(
        _registry: &CodecRegistry,
    ) -> Result<Box<dyn PayloadUnmarshaller<Self>>, AmbiguousCodecError> {
        Ok(Box::new(TextUnmarshaller))
    }
}

impl Output for String {
    fn marshaller(
        _registry: &CodecRegistry,
    ) -> Result<Box<dyn ResultMarshaller<Self>>, AmbiguousCodecError> {
        Ok(Box::new(TextMarshaller))
    }
}
