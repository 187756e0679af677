//! The transport-ready result of a successful invocation.

use bytes::Bytes;

/// Media type of JSON results.
pub const JSON_MEDIA_TYPE: &str = "application/json; charset=utf-8";

/// Media type of raw byte results.
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

/// A marshalled handler result: media type plus body.
///
/// Produced fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    media_type: String,
    body: Bytes,
}

impl InvocationResult {
    pub fn new(media_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            media_type: media_type.into(),
            body: body.into(),
        }
    }

    /// A JSON body.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::new(JSON_MEDIA_TYPE, body)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Splits into `(media_type, body)`.
    pub fn into_parts(self) -> (String, Bytes) {
        (self.media_type, self.body)
    }
}
