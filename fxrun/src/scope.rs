//! Request-scoped diagnostic context.

use fxrun_core::{EventEnvelope, InvocationCredentials};
use tracing::{Span, field};

/// Correlation data for one invocation.
///
/// Created per request and passed by reference through every pipeline step.
/// Log lines name its span as their parent, so concurrent invocations never
/// share correlation state.
#[derive(Debug)]
pub struct RequestScope {
    invocation_id: String,
    function: String,
    span: Span,
}

impl RequestScope {
    /// Opens the scope for `envelope` on the named function.
    pub fn new(function: &str, envelope: &EventEnvelope) -> Self {
        let span = tracing::info_span!(
            "invocation",
            function = %function,
            invocation_id = %envelope.id(),
            event_type = %envelope.event_type(),
            trace_parent = field::Empty,
            request_id = field::Empty,
        );
        if let Some(trace_parent) = envelope.trace_parent() {
            span.record("trace_parent", trace_parent);
        }
        Self {
            invocation_id: envelope.id().to_string(),
            function: function.to_string(),
            span,
        }
    }

    /// Records the request id once credentials are decoded.
    pub fn record_credentials(&self, credentials: &InvocationCredentials) {
        self.span
            .record("request_id", credentials.request_id.as_str());
    }

    /// The envelope id.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// The function name.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The span every log line of this invocation belongs to.
    pub fn span(&self) -> &Span {
        &self.span
    }
}
