//! The inbound protocol message.
//!
//! An [`EventEnvelope`] is one CloudEvents-style invocation event: identity and
//! routing attributes, the payload bytes and a map of named extension
//! attributes. It is immutable once built and lives for one request.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Event type of a synchronous function invocation.
pub const SYNC_INVOKE_TYPE: &str = "com.salesforce.function.invoke.sync";

/// Legacy probe event type, still accepted for compatibility.
pub const LEGACY_PROBE_TYPE: &str = "com.evergreen.functions.test";

/// Extension carrying the base64 platform context.
pub const PLATFORM_CONTEXT_EXTENSION: &str = "sfcontext";

/// Extension carrying the base64 invocation credentials.
pub const CREDENTIALS_EXTENSION: &str = "sffncontext";

/// W3C trace-context extension.
pub const TRACE_PARENT_EXTENSION: &str = "traceparent";

/// Errors building an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// A required attribute is absent or empty.
    #[error("required attribute `{0}` is missing")]
    MissingAttribute(&'static str),

    /// A structured event could not be parsed.
    #[error("malformed structured event: {0}")]
    Malformed(String),
}

/// The value of an extension attribute.
///
/// Only [`ExtensionValue::String`] values are meaningful to the context
/// decoder; the other variants are opaque to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionValue {
    /// A plain string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// Raw binary.
    Binary(Bytes),
}

impl ExtensionValue {
    /// Returns the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtensionValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        ExtensionValue::String(value.to_string())
    }
}

impl From<String> for ExtensionValue {
    fn from(value: String) -> Self {
        ExtensionValue::String(value)
    }
}

impl From<bool> for ExtensionValue {
    fn from(value: bool) -> Self {
        ExtensionValue::Boolean(value)
    }
}

impl From<i64> for ExtensionValue {
    fn from(value: i64) -> Self {
        ExtensionValue::Integer(value)
    }
}

impl From<Bytes> for ExtensionValue {
    fn from(value: Bytes) -> Self {
        ExtensionValue::Binary(value)
    }
}

/// One inbound invocation event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    id: String,
    source: String,
    event_type: String,
    time: Option<DateTime<Utc>>,
    data_content_type: Option<String>,
    data_schema: Option<String>,
    data: Option<Bytes>,
    extensions: BTreeMap<String, ExtensionValue>,
}

impl EventEnvelope {
    /// Starts building an envelope from its three required attributes.
    pub fn builder(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> EnvelopeBuilder {
        EnvelopeBuilder {
            id: id.into(),
            source: source.into(),
            event_type: event_type.into(),
            time: None,
            data_content_type: None,
            data_schema: None,
            data: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Parses a structured-mode JSON event.
    ///
    /// `data` is kept as its JSON text (a JSON string member is kept verbatim
    /// as text when the content type is not JSON); `data_base64` is decoded
    /// by the caller-supplied `decode_base64`. Unrecognized top-level string,
    /// boolean and integer members become extensions; other members are
    /// ignored.
    pub fn from_structured<F>(json: &[u8], decode_base64: F) -> Result<Self, EnvelopeError>
    where
        F: Fn(&str) -> Option<Vec<u8>>,
    {
        let value: Value =
            serde_json::from_slice(json).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        let Value::Object(mut members) = value else {
            return Err(EnvelopeError::Malformed("expected a JSON object".into()));
        };

        let id = take_string(&mut members, "id")?.ok_or(EnvelopeError::MissingAttribute("id"))?;
        let source =
            take_string(&mut members, "source")?.ok_or(EnvelopeError::MissingAttribute("source"))?;
        let event_type =
            take_string(&mut members, "type")?.ok_or(EnvelopeError::MissingAttribute("type"))?;

        let mut builder = EventEnvelope::builder(id, source, event_type);

        members.remove("specversion");
        if let Some(time) = take_string(&mut members, "time")? {
            let parsed = DateTime::parse_from_rfc3339(&time)
                .map_err(|e| EnvelopeError::Malformed(format!("time: {e}")))?;
            builder = builder.time(parsed.with_timezone(&Utc));
        }
        let content_type = take_string(&mut members, "datacontenttype")?;
        if let Some(schema) = take_string(&mut members, "dataschema")? {
            builder = builder.data_schema(schema);
        }

        if let Some(encoded) = take_string(&mut members, "data_base64")? {
            let decoded = decode_base64(&encoded)
                .ok_or_else(|| EnvelopeError::Malformed("data_base64 is not base64".into()))?;
            builder = builder.data(decoded);
        } else if let Some(data) = members.remove("data") {
            let is_json = content_type
                .as_deref()
                .is_none_or(|ct| ct.starts_with("application/json"));
            let bytes = match data {
                Value::String(text) if !is_json => text.into_bytes(),
                other => serde_json::to_vec(&other)
                    .map_err(|e| EnvelopeError::Malformed(e.to_string()))?,
            };
            builder = builder.data(bytes);
        }
        if let Some(ct) = content_type {
            builder = builder.data_content_type(ct);
        }

        for (name, value) in members {
            let extension = match value {
                Value::String(s) => ExtensionValue::String(s),
                Value::Bool(b) => ExtensionValue::Boolean(b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => ExtensionValue::Integer(i),
                    None => continue,
                },
                _ => continue,
            };
            builder = builder.extension(name, extension);
        }

        builder.build()
    }

    /// The event id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The event source URI reference.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The event type.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The event timestamp, if present.
    pub fn time(&self) -> Option<&DateTime<Utc>> {
        self.time.as_ref()
    }

    /// The media type of [`EventEnvelope::data`], if present.
    pub fn data_content_type(&self) -> Option<&str> {
        self.data_content_type.as_deref()
    }

    /// The data schema URI, if present.
    pub fn data_schema(&self) -> Option<&str> {
        self.data_schema.as_deref()
    }

    /// The raw payload bytes, if present.
    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Looks up an extension attribute by name.
    pub fn extension(&self, name: &str) -> Option<&ExtensionValue> {
        self.extensions.get(name)
    }

    /// Iterates all extension attributes in name order.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &ExtensionValue)> {
        self.extensions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The W3C `traceparent` extension, if present and a string.
    pub fn trace_parent(&self) -> Option<&str> {
        self.extension(TRACE_PARENT_EXTENSION)
            .and_then(ExtensionValue::as_str)
    }

    /// Whether the content type declares JSON data.
    pub fn is_json(&self) -> bool {
        self.data_content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
    }
}

fn take_string(
    members: &mut Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, EnvelopeError> {
    match members.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(EnvelopeError::Malformed(format!(
            "attribute `{name}` must be a string"
        ))),
    }
}

/// Builder for [`EventEnvelope`].
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    id: String,
    source: String,
    event_type: String,
    time: Option<DateTime<Utc>>,
    data_content_type: Option<String>,
    data_schema: Option<String>,
    data: Option<Bytes>,
    extensions: BTreeMap<String, ExtensionValue>,
}

impl EnvelopeBuilder {
    /// Sets the event timestamp.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the data content type.
    pub fn data_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.data_content_type = Some(content_type.into());
        self
    }

    /// Sets the data schema URI.
    pub fn data_schema(mut self, schema: impl Into<String>) -> Self {
        self.data_schema = Some(schema.into());
        self
    }

    /// Sets the payload bytes.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Adds or replaces an extension attribute.
    pub fn extension(mut self, name: impl Into<String>, value: impl Into<ExtensionValue>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    /// Builds the envelope, rejecting empty required attributes.
    pub fn build(self) -> Result<EventEnvelope, EnvelopeError> {
        if self.id.is_empty() {
            return Err(EnvelopeError::MissingAttribute("id"));
        }
        if self.source.is_empty() {
            return Err(EnvelopeError::MissingAttribute("source"));
        }
        if self.event_type.is_empty() {
            return Err(EnvelopeError::MissingAttribute("type"));
        }
        Ok(EventEnvelope {
            id: self.id,
            source: self.source,
            event_type: self.event_type,
            time: self.time,
            data_content_type: self.data_content_type,
            data_schema: self.data_schema,
            data: self.data,
            extensions: self.extensions,
        })
    }
}
