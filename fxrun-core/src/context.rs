//! # Invocation Context
//!
//! Typed forms of the two out-of-band context blocks carried as envelope
//! extensions, and the seam through which handlers receive a context object.
//!
//! - [`PlatformContext`] - decoded from the `sfcontext` extension
//! - [`InvocationCredentials`] - decoded from the `sffncontext` extension
//! - [`ContextInitializer`] - builds the handler-facing context from both
//! - [`FunctionContext`] - the fixed context structure handed to two-argument
//!   handlers
//!
//! The JSON field names are a wire contract. In particular the credentials
//! field `apexClassFQN` is spelled with an all-caps `FQN` on the wire and binds
//! to [`InvocationCredentials::apex_class_fqn`].

use crate::error::BoxError;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, future::Future};

/// Reads `null` the same as an absent member.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The user on whose behalf a function is invoked.
///
/// Every field except `on_behalf_of_user_id` is required for the context to
/// be usable. Decoding does not enforce that; missing or `null` members decode
/// as empty strings and [`UserContext::missing_fields`] reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserContext {
    #[serde(deserialize_with = "null_as_default")]
    pub org_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_behalf_of_user_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub salesforce_base_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub org_domain_url: String,
}

impl UserContext {
    /// Names (wire spelling) of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("orgId", &self.org_id),
            ("userId", &self.user_id),
            ("username", &self.username),
            ("salesforceBaseUrl", &self.salesforce_base_url),
            ("orgDomainUrl", &self.org_domain_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Platform context decoded from the `sfcontext` extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformContext {
    #[serde(deserialize_with = "null_as_default")]
    pub api_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payload_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_context: UserContext,
}

/// Credentials decoded from the `sffncontext` extension.
///
/// `Debug` output redacts the access token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvocationCredentials {
    #[serde(deserialize_with = "null_as_default")]
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_invocation_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apex_class_id: Option<String>,
    #[serde(rename = "apexClassFQN", skip_serializing_if = "Option::is_none")]
    pub apex_class_fqn: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource: String,
}

impl fmt::Debug for InvocationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationCredentials")
            .field("access_token", &"<redacted>")
            .field("function_invocation_id", &self.function_invocation_id)
            .field("function_name", &self.function_name)
            .field("apex_class_id", &self.apex_class_id)
            .field("apex_class_fqn", &self.apex_class_fqn)
            .field("request_id", &self.request_id)
            .field("resource", &self.resource)
            .finish()
    }
}

/// Builds the context object a handler receives next to its payload.
///
/// Implementations may perform I/O; the pipeline awaits them without a
/// timeout of its own. A failure surfaces as `SdkInitializationError`.
pub trait ContextInitializer: Send + Sync + 'static {
    /// The context type handed to the handler.
    type Context: Send + 'static;

    /// Builds a context from the decoded extensions.
    fn initialize(
        &self,
        credentials: &InvocationCredentials,
        platform: &PlatformContext,
    ) -> impl Future<Output = Result<Self::Context, BoxError>> + Send;
}

/// Initializer for handlers that take only a payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

impl ContextInitializer for NoContext {
    type Context = ();

    async fn initialize(
        &self,
        _credentials: &InvocationCredentials,
        _platform: &PlatformContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// The user a function runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub on_behalf_of_user_id: Option<String>,
}

/// The org a function runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Org {
    pub id: String,
    pub base_url: String,
    pub domain_url: String,
    pub api_version: String,
    pub payload_version: String,
    pub user: User,
}

/// Context handed to two-argument handlers.
///
/// This is a fixed structure owned by the host; handlers depend on it
/// directly. The access token is meant for the data-platform client.
#[derive(Clone, PartialEq, Eq)]
pub struct FunctionContext {
    pub invocation_id: String,
    pub function_name: String,
    pub request_id: String,
    pub resource: String,
    pub org: Org,
    access_token: String,
}

impl FunctionContext {
    /// Assembles a context. Validation is the initializer's job.
    pub fn new(
        invocation_id: impl Into<String>,
        credentials: &InvocationCredentials,
        platform: &PlatformContext,
    ) -> Self {
        let user = &platform.user_context;
        Self {
            invocation_id: invocation_id.into(),
            function_name: credentials.function_name.clone(),
            request_id: credentials.request_id.clone(),
            resource: credentials.resource.clone(),
            org: Org {
                id: user.org_id.clone(),
                base_url: user.salesforce_base_url.clone(),
                domain_url: user.org_domain_url.clone(),
                api_version: platform.api_version.clone(),
                payload_version: platform.payload_version.clone(),
                user: User {
                    id: user.user_id.clone(),
                    username: user.username.clone(),
                    on_behalf_of_user_id: user.on_behalf_of_user_id.clone(),
                },
            },
            access_token: credentials.access_token.clone(),
        }
    }

    /// The opaque access token for downstream API calls.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for FunctionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionContext")
            .field("invocation_id", &self.invocation_id)
            .field("function_name", &self.function_name)
            .field("request_id", &self.request_id)
            .field("resource", &self.resource)
            .field("org", &self.org)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqn_wire_spelling() {
        let json = r#"{
            "accessToken": "00Dxx!token",
            "functionName": "MyFunction",
            "apexClassFQN": "ns.MyClass",
            "requestId": "req-1",
            "resource": "https://example.my.salesforce.com",
            "somethingNew": [1, 2, 3]
        }"#;
        let creds: InvocationCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.apex_class_fqn.as_deref(), Some("ns.MyClass"));
        assert_eq!(creds.function_invocation_id, None);

        let back = serde_json::to_value(&creds).unwrap();
        assert_eq!(back["apexClassFQN"], "ns.MyClass");
        assert!(back.get("apexClassFqn").is_none());
    }

    #[test]
    fn test_missing_fields_reported() {
        let json = r#"{"apiVersion": "50.0", "userContext": {"orgId": "00D", "username": "u"}}"#;
        let ctx: PlatformContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.payload_version, "");
        assert_eq!(
            ctx.user_context.missing_fields(),
            vec!["userId", "salesforceBaseUrl", "orgDomainUrl"]
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = InvocationCredentials {
            access_token: "secret-token".into(),
            ..Default::default()
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_null_members_read_as_missing() {
        let json = r#"{
            "apiVersion": null,
            "payloadVersion": "0.1",
            "userContext": {"orgId": "00D", "userId": null, "username": "u",
                "salesforceBaseUrl": "https://a", "orgDomainUrl": "https://b"}
        }"#;
        let ctx: PlatformContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.api_version, "");
        assert_eq!(ctx.user_context.missing_fields(), vec!["userId"]);

        let ctx: PlatformContext = serde_json::from_str(r#"{"userContext": null}"#).unwrap();
        assert_eq!(ctx.user_context, UserContext::default());

        let creds: InvocationCredentials =
            serde_json::from_str(r#"{"accessToken": null, "requestId": null}"#).unwrap();
        assert_eq!(creds.access_token, "");
        assert_eq!(creds.request_id, "");
    }

    #[tokio::test]
    async fn test_no_context() {
        let result = NoContext
            .initialize(&InvocationCredentials::default(), &PlatformContext::default())
            .await;
        assert!(result.is_ok());
    }
}
