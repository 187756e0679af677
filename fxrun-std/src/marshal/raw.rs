use super::{Output, Payload, PayloadUnmarshaller, ResultMarshaller, Strategy};
use crate::registry::CodecRegistry;
use bytes::Bytes;
use fxrun_core::{
    AmbiguousCodecError, EventEnvelope, InvocationResult, MarshalError, OCTET_STREAM_MEDIA_TYPE,
    UnmarshalError,
};

/// Hands the payload bytes over verbatim; absent data becomes empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawUnmarshaller;

impl PayloadUnmarshaller<Bytes> for RawUnmarshaller {
    fn strategy(&self) -> Strategy {
        Strategy::Raw
    }

    fn requires_json(&self) -> bool {
        false
    }

    fn unmarshal(&self, envelope: &EventEnvelope) -> Result<Bytes, UnmarshalError> {
        Ok(envelope.data().cloned().unwrap_or_default())
    }
}

/// Passes returned bytes through as `application/octet-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMarshaller;

impl ResultMarshaller<Bytes> for RawMarshaller {
    fn strategy(&self) -> Strategy {
        Strategy::Raw
    }

    fn marshal(&self, value: Bytes) -> Result<InvocationResult, MarshalError> {
        Ok(InvocationResult::new(OCTET_STREAM_MEDIA_TYPE, value))
    }
}

impl Payload for Bytes {
    fn unmarshaller(
        _registry: &CodecRegistry,
    ) -> Result<Box<dyn PayloadUnmarshaller<Self>>, AmbiguousCodecError> {
        Ok(Box::new(RawUnmarshaller))
    }
}

impl Output for Bytes {
    fn marshaller(
        _registry: &CodecRegistry,
    ) -> Result<Box<dyn ResultMarshaller<Self>>, AmbiguousCodecError> {
        Ok(Box::new(RawMarshaller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxrun_core::SYNC_INVOKE_TYPE;

    #[test]
    fn test_raw_accepts_anything() {
        let envelope = EventEnvelope::builder("1", "urn:x", SYNC_INVOKE_TYPE)
            .data_content_type("image/png")
            .data(vec![0x89, 0x50, 0x4e, 0x47])
            .build()
            .unwrap();
        let bytes = RawUnmarshaller.unmarshal(&envelope).unwrap();
        assert_eq!(&bytes[..], &[0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_raw_absent_data_is_empty() {
        let envelope = EventEnvelope::builder("1", "urn:x", SYNC_INVOKE_TYPE)
            .build()
            .unwrap();
        assert!(RawUnmarshaller.unmarshal(&envelope).unwrap().is_empty());
    }

    #[test]
    fn test_raw_result_media_type() {
        let result = RawMarshaller.marshal(Bytes::from_static(b"\x00\x01")).unwrap();
        assert_eq!(result.media_type(), "application/octet-stream");
        assert_eq!(&result.body()[..], b"\x00\x01");
    }
}
