//! Testing utilities for fxrun.
//!
//! This module provides fixtures to make testing pipelines, initializers and
//! handlers easier.
//!
//! # Features
//!
//! - [`EnvelopeFixture`]: Builds a well-formed invocation envelope
//! - [`sample_platform_context`], [`sample_credentials`]: Complete context blocks
//! - [`CountingHandler`]: Echoes its payload and counts calls
//! - [`RecordingHandler`]: Records every payload and context it receives
//! - [`FailingHandler`], [`PanickingHandler`]: Fail in the two possible ways

use crate::decoder::encode_extension;
use bytes::Bytes;
use fxrun_core::{
    BoxError, CREDENTIALS_EXTENSION, EventEnvelope, ExtensionValue, Handler,
    InvocationCredentials, PLATFORM_CONTEXT_EXTENSION, PlatformContext, SYNC_INVOKE_TYPE,
    UserContext,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Sample Context
// ============================================================================

/// A platform context with every required field present.
pub fn sample_platform_context() -> PlatformContext {
    let url = "http://pistachio-virgo-1063-dev-ed.localhost.internal.salesforce.com:6109";
    PlatformContext {
        api_version: "50.0".into(),
        payload_version: "0.1".into(),
        user_context: UserContext {
            org_id: "00Dxx0000006IYJ".into(),
            user_id: "005xx000001X8Uz".into(),
            on_behalf_of_user_id: None,
            username: "test-zqisnf6ytlqv@example.com".into(),
            salesforce_base_url: url.into(),
            org_domain_url: url.into(),
        },
    }
}

/// Credentials with every required field present.
pub fn sample_credentials() -> InvocationCredentials {
    InvocationCredentials {
        access_token: "00Dxx0000006IYJ!AQEAQNRaM".into(),
        function_invocation_id: Some("00Fxx000001ApY1".into()),
        function_name: "MyFunction".into(),
        apex_class_id: None,
        apex_class_fqn: None,
        request_id: "00Dxx0000006IYJEA2-4Y4W3Lw_LkoskcHdEaZze--MyFunction-2020-09-03T20:56:27.608444Z"
            .into(),
        resource: "http://pistachio-virgo-1063-dev-ed.localhost.internal.salesforce.com:6109"
            .into(),
    }
}

// ============================================================================
// Envelope Fixture
// ============================================================================

/// Builds invocation envelopes for tests.
///
/// Starts out as a synchronous invocation with JSON content, the
/// `"test message"` payload and well-formed context extensions.
///
/// # Example
///
/// ```rust,ignore
/// let envelope = EnvelopeFixture::new()
///     .content_type("text/plain")
///     .data("hello")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFixture {
    id: String,
    source: String,
    event_type: String,
    content_type: Option<String>,
    data: Option<Bytes>,
    platform: Option<PlatformContext>,
    credentials: Option<InvocationCredentials>,
    raw_extensions: BTreeMap<String, ExtensionValue>,
}

impl Default for EnvelopeFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeFixture {
    /// Create a fixture for a valid synchronous invocation.
    pub fn new() -> Self {
        Self {
            id: "00Dxx0000006IYJEA2-4Y4W3Lw_LkoskcHdEaZze".into(),
            source: "urn:event:from:salesforce/xx/228.0/00Dxx0000006IYJ/apex/MyFunctionApex:test():7"
                .into(),
            event_type: SYNC_INVOKE_TYPE.into(),
            content_type: Some("application/json".into()),
            data: Some(Bytes::from_static(br#""test message""#)),
            platform: Some(sample_platform_context()),
            credentials: Some(sample_credentials()),
            raw_extensions: BTreeMap::new(),
        }
    }

    /// Set the event id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Set the data content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Drop the data content type.
    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    /// Set the payload bytes.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the payload to the JSON rendering of `value`.
    pub fn json_data<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(Bytes::from(serde_json::to_vec(value)?));
        Ok(self)
    }

    /// Drop the payload.
    pub fn without_data(mut self) -> Self {
        self.data = None;
        self
    }

    /// Replace the platform context.
    pub fn platform_context(mut self, platform: PlatformContext) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Drop the `sfcontext` extension.
    pub fn without_platform_context(mut self) -> Self {
        self.platform = None;
        self
    }

    /// Replace the credentials.
    pub fn credentials(mut self, credentials: InvocationCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Drop the `sffncontext` extension.
    pub fn without_credentials(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// Set an extension verbatim; overrides the encoded context blocks.
    pub fn raw_extension(
        mut self,
        name: impl Into<String>,
        value: impl Into<ExtensionValue>,
    ) -> Self {
        self.raw_extensions.insert(name.into(), value.into());
        self
    }

    /// Build the envelope.
    pub fn build(self) -> Result<EventEnvelope, BoxError> {
        let mut builder = EventEnvelope::builder(self.id, self.source, self.event_type);
        if let Some(content_type) = self.content_type {
            builder = builder.data_content_type(content_type);
        }
        if let Some(data) = self.data {
            builder = builder.data(data);
        }
        if let Some(platform) = &self.platform {
            builder = builder.extension(PLATFORM_CONTEXT_EXTENSION, encode_extension(platform)?);
        }
        if let Some(credentials) = &self.credentials {
            builder = builder.extension(CREDENTIALS_EXTENSION, encode_extension(credentials)?);
        }
        for (name, value) in self.raw_extensions {
            builder = builder.extension(name, value);
        }
        Ok(builder.build()?)
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A text handler that echoes its payload and counts invocations.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingHandler::new();
/// let descriptor = HandlerDescriptor::builder(counter.clone()).build(&registry)?;
///
/// descriptor.apply(&envelope).await?;
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Handler for CountingHandler {
    type Payload = String;
    type Context = ();
    type Output = String;

    async fn call(&self, payload: String, _context: ()) -> Result<String, BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(payload)
    }
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records every payload and context, returning the payload.
pub struct RecordingHandler<P, C> {
    calls: Arc<Mutex<Vec<(P, C)>>>,
}

impl<P: Clone, C: Clone> RecordingHandler<P, C> {
    /// Create a new recording handler.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a clone of the recorded calls.
    pub fn calls(&self) -> Vec<(P, C)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<P: Clone, C: Clone> Default for RecordingHandler<P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C> Clone for RecordingHandler<P, C> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<P, C> Handler for RecordingHandler<P, C>
where
    P: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    type Payload = P;
    type Context = C;
    type Output = P;

    async fn call(&self, payload: P, context: C) -> Result<P, BoxError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((payload.clone(), context));
        Ok(payload)
    }
}

// ============================================================================
// Failing Handlers
// ============================================================================

/// A text handler that always returns an error with the given message.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Handler for FailingHandler {
    type Payload = String;
    type Context = ();
    type Output = String;

    async fn call(&self, _payload: String, _context: ()) -> Result<String, BoxError> {
        Err(self.message.clone().into())
    }
}

/// A text handler that always panics with the given message.
#[derive(Debug, Clone)]
pub struct PanickingHandler {
    message: String,
}

impl PanickingHandler {
    /// Create a handler panicking with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Handler for PanickingHandler {
    type Payload = String;
    type Context = ();
    type Output = String;

    async fn call(&self, _payload: String, _context: ()) -> Result<String, BoxError> {
        panic!("{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{decode_credentials, decode_platform_context};

    #[test]
    fn test_fixture_carries_decodable_context() {
        let envelope = EnvelopeFixture::new().build().unwrap();
        assert_eq!(envelope.event_type(), SYNC_INVOKE_TYPE);
        assert_eq!(decode_platform_context(&envelope), Some(sample_platform_context()));
        assert_eq!(decode_credentials(&envelope), Some(sample_credentials()));
    }

    #[test]
    fn test_raw_extension_overrides_context() {
        let envelope = EnvelopeFixture::new()
            .raw_extension(PLATFORM_CONTEXT_EXTENSION, "!!not base64!!")
            .build()
            .unwrap();
        assert_eq!(decode_platform_context(&envelope), None);
    }

    #[tokio::test]
    async fn test_recording_handler_records() {
        let recorder = RecordingHandler::<String, u32>::new();
        let out = recorder.call("hi".into(), 7).await.unwrap();
        assert_eq!(out, "hi");
        assert_eq!(recorder.calls(), vec![("hi".to_string(), 7)]);
    }

    #[tokio::test]
    async fn test_counting_handler_counts() {
        let counter = CountingHandler::new();
        counter.call("a".into(), ()).await.unwrap();
        counter.clone().call("b".into(), ()).await.unwrap();
        assert_eq!(counter.count(), 2);
    }
}
