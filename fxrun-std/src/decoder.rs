//! Context extension decoder.
//!
//! Both context extensions are base64-encoded UTF-8 JSON. Any failure along
//! the way (value not a string, bad base64, bad JSON, wrong JSON shape)
//! yields `None`; absence and malformation are indistinguishable to callers.
//! Unknown JSON members are ignored and missing members decode as empty
//! values, so completeness is checked by whoever consumes the context.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use fxrun_core::{
    CREDENTIALS_EXTENSION, EnvelopeError, EventEnvelope, ExtensionValue, InvocationCredentials,
    PLATFORM_CONTEXT_EXTENSION, PlatformContext,
};
use serde::{Serialize, de::DeserializeOwned};

/// Decodes the `sfcontext` extension.
pub fn decode_platform_context(envelope: &EventEnvelope) -> Option<PlatformContext> {
    decode_extension(envelope, PLATFORM_CONTEXT_EXTENSION)
}

/// Decodes the `sffncontext` extension.
pub fn decode_credentials(envelope: &EventEnvelope) -> Option<InvocationCredentials> {
    decode_extension(envelope, CREDENTIALS_EXTENSION)
}

/// Decodes any base64 JSON extension into `T`.
pub fn decode_extension<T: DeserializeOwned>(envelope: &EventEnvelope, name: &str) -> Option<T> {
    let encoded = envelope.extension(name).and_then(ExtensionValue::as_str)?;
    let raw = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8_lossy(&raw);
    serde_json::from_str(&text).ok()
}

/// Encodes `value` the way the context extensions are carried on the wire.
pub fn encode_extension<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(STANDARD.encode(json))
}

/// Parses a structured-mode JSON event, decoding `data_base64` as standard
/// base64.
pub fn decode_structured(json: &[u8]) -> Result<EventEnvelope, EnvelopeError> {
    EventEnvelope::from_structured(json, |encoded| STANDARD.decode(encoded).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxrun_core::SYNC_INVOKE_TYPE;

    fn envelope_with(name: &str, value: impl Into<ExtensionValue>) -> EventEnvelope {
        EventEnvelope::builder("id-1", "urn:event:from:test", SYNC_INVOKE_TYPE)
            .extension(name, value)
            .build()
            .unwrap()
    }

    fn b64(text: &str) -> String {
        STANDARD.encode(text)
    }

    #[test]
    fn test_decodes_platform_context() {
        let json = r#"{
            "apiVersion": "50.0",
            "payloadVersion": "0.1",
            "userContext": {
                "orgId": "00Dxx0000006IYJ",
                "userId": "005xx000001X8Uz",
                "onBehalfOfUserId": null,
                "username": "test-zqisnf6ytlqv@example.com",
                "salesforceBaseUrl": "http://pistachio-virgo-1063-dev-ed.localhost.internal.salesforce.com:6109",
                "orgDomainUrl": "http://pistachio-virgo-1063-dev-ed.localhost.internal.salesforce.com:6109"
            }
        }"#;
        let envelope = envelope_with("sfcontext", b64(json));

        let ctx = decode_platform_context(&envelope).unwrap();
        assert_eq!(ctx.api_version, "50.0");
        assert_eq!(ctx.user_context.org_id, "00Dxx0000006IYJ");
        assert_eq!(ctx.user_context.on_behalf_of_user_id, None);
        assert!(ctx.user_context.missing_fields().is_empty());
    }

    #[test]
    fn test_decodes_credentials_with_fqn_and_unknown_fields() {
        let json = r#"{
            "accessToken": "00Dxx0000006IYJ!AQEAQNRaM3",
            "functionInvocationId": null,
            "functionName": "MyFunction",
            "apexClassId": null,
            "apexClassFQN": "ns.MyClass",
            "requestId": "00Dxx0000006IYJEA2-4Y4W3Lw_LkoskcHdEaZze-uuid-MyFunction-2020-09-03T20:56:27.608444Z",
            "resource": "http://pistachio-virgo-1063-dev-ed.localhost.internal.salesforce.com:6109",
            "futureField": {"nested": true}
        }"#;
        let envelope = envelope_with("sffncontext", b64(json));

        let creds = decode_credentials(&envelope).unwrap();
        assert_eq!(creds.function_name, "MyFunction");
        assert_eq!(creds.apex_class_fqn.as_deref(), Some("ns.MyClass"));
        assert_eq!(creds.apex_class_id, None);
    }

    #[test]
    fn test_null_required_members_still_decode() {
        let json = r#"{
            "apiVersion": "50.0",
            "payloadVersion": "0.1",
            "userContext": {
                "orgId": "00Dxx0000006IYJ",
                "userId": null,
                "username": "user@example.com",
                "salesforceBaseUrl": "https://example.my.salesforce.com",
                "orgDomainUrl": "https://example.my.salesforce.com"
            }
        }"#;
        let ctx = decode_platform_context(&envelope_with("sfcontext", b64(json))).unwrap();
        assert_eq!(ctx.user_context.missing_fields(), vec!["userId"]);

        let json = r#"{"accessToken": "t", "functionName": null, "requestId": null,
            "resource": "https://example.com"}"#;
        let creds = decode_credentials(&envelope_with("sffncontext", b64(json))).unwrap();
        assert_eq!(creds.function_name, "");
        assert_eq!(creds.request_id, "");
    }

    #[test]
    fn test_missing_extension_is_none() {
        let envelope = EventEnvelope::builder("id-1", "urn:x", SYNC_INVOKE_TYPE)
            .build()
            .unwrap();
        assert!(decode_platform_context(&envelope).is_none());
        assert!(decode_credentials(&envelope).is_none());
    }

    #[test]
    fn test_non_string_extension_is_none() {
        assert!(decode_platform_context(&envelope_with("sfcontext", 42i64)).is_none());
        assert!(decode_platform_context(&envelope_with("sfcontext", true)).is_none());
    }

    #[test]
    fn test_malformed_values_are_none() {
        for value in [
            String::new(),
            "%%% not base64 %%%".to_string(),
            b64("{not json"),
            b64("[1, 2, 3]"),
            b64(r#"{"apiVersion": 50}"#),
        ] {
            let envelope = envelope_with("sfcontext", value.clone());
            assert!(
                decode_platform_context(&envelope).is_none(),
                "expected none for {value:?}"
            );
        }
    }

    #[test]
    fn test_invalid_utf8_is_none() {
        let envelope = envelope_with("sffncontext", STANDARD.encode([0xff, 0xfe, 0xfd]));
        assert!(decode_credentials(&envelope).is_none());
    }

    #[test]
    fn test_encode_then_decode() {
        let creds = InvocationCredentials {
            access_token: "token".into(),
            function_name: "fn".into(),
            request_id: "req".into(),
            resource: "https://example.com".into(),
            apex_class_fqn: Some("A.B".into()),
            ..Default::default()
        };
        let envelope = envelope_with("sffncontext", encode_extension(&creds).unwrap());
        assert_eq!(decode_credentials(&envelope), Some(creds));
    }

    #[test]
    fn test_structured_event_with_base64_data() {
        let json = format!(
            r#"{{"specversion": "1.0", "id": "e-1", "source": "urn:x", "type": "{SYNC_INVOKE_TYPE}",
                "datacontenttype": "application/octet-stream", "data_base64": "{}",
                "sfcontext": "{}"}}"#,
            b64("raw bytes"),
            b64(r#"{"apiVersion": "50.0"}"#),
        );
        let envelope = decode_structured(json.as_bytes()).unwrap();
        assert_eq!(envelope.data().map(|d| d.to_vec()), Some(b"raw bytes".to_vec()));
        assert_eq!(decode_platform_context(&envelope).unwrap().api_version, "50.0");

        let bad = r#"{"id": "e-1", "source": "urn:x", "type": "t", "data_base64": "%%%"}"#;
        assert!(matches!(
            decode_structured(bad.as_bytes()),
            Err(EnvelopeError::Malformed(_))
        ));
    }
}
