//! Pipeline configuration.

use fxrun_core::{LEGACY_PROBE_TYPE, SYNC_INVOKE_TYPE};

/// When the envelope must declare JSON content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentTypePolicy {
    /// Only JSON-based payload strategies (list, object) require JSON content
    /// and non-empty data.
    #[default]
    PerStrategy,
    /// Every payload strategy requires JSON content and non-empty data.
    AlwaysJson,
}

impl ContentTypePolicy {
    /// Whether a strategy with the given sensitivity must see JSON content.
    pub fn requires_json(self, strategy_requires_json: bool) -> bool {
        match self {
            ContentTypePolicy::PerStrategy => strategy_requires_json,
            ContentTypePolicy::AlwaysJson => true,
        }
    }
}

/// Request-independent settings of an invocation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    accepted_types: Vec<String>,
    content_type_policy: ContentTypePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            accepted_types: vec![SYNC_INVOKE_TYPE.to_string(), LEGACY_PROBE_TYPE.to_string()],
            content_type_policy: ContentTypePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Start from the defaults.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `event_type` is accepted for invocation.
    pub fn accepts(&self, event_type: &str) -> bool {
        self.accepted_types.iter().any(|t| t == event_type)
    }

    /// The accepted event types.
    pub fn accepted_types(&self) -> &[String] {
        &self.accepted_types
    }

    /// The content-type policy.
    pub fn content_type_policy(&self) -> ContentTypePolicy {
        self.content_type_policy
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Accept one more event type.
    pub fn accept_type(mut self, event_type: impl Into<String>) -> Self {
        let event_type = event_type.into();
        if !self.config.accepted_types.contains(&event_type) {
            self.config.accepted_types.push(event_type);
        }
        self
    }

    /// Replace the accepted event types.
    pub fn accepted_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.accepted_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the content-type policy.
    pub fn content_type_policy(mut self, policy: ContentTypePolicy) -> Self {
        self.config.content_type_policy = policy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_accept_sync_and_probe() {
        let config = PipelineConfig::default();
        assert!(config.accepts("com.salesforce.function.invoke.sync"));
        assert!(config.accepts("com.evergreen.functions.test"));
        assert!(!config.accepts("com.salesforce.function.invoke.async"));
        assert_eq!(config.content_type_policy(), ContentTypePolicy::PerStrategy);
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder()
            .accepted_types([SYNC_INVOKE_TYPE])
            .accept_type("com.example.invoke")
            .accept_type("com.example.invoke")
            .content_type_policy(ContentTypePolicy::AlwaysJson)
            .build();
        assert_eq!(config.accepted_types().len(), 2);
        assert!(!config.accepts(LEGACY_PROBE_TYPE));
        assert!(config.content_type_policy().requires_json(false));
        assert!(!ContentTypePolicy::PerStrategy.requires_json(false));
    }
}
