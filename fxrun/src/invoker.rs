//! Object-safe invocation and the function lookup table.

use crate::pipeline::InvocationPipeline;
use fxrun_core::{EventEnvelope, InvocationError, InvocationResult};
use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};
use tracing::warn;

/// Boxed future returned by [`DynInvoker::apply_dyn`].
pub type InvocationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<InvocationResult, InvocationError>> + Send + 'a>>;

/// Dynamic object-safe version of [`InvocationPipeline`].
///
/// Use this trait when handlers with different payload and return types must
/// sit in one collection.
pub trait DynInvoker: Send + Sync + 'static {
    /// The function name.
    fn name(&self) -> &str;

    /// Processes one envelope (dynamic dispatch version).
    fn apply_dyn<'a>(&'a self, envelope: &'a EventEnvelope) -> InvocationFuture<'a>;
}

// Blanket implementation: every pipeline is a DynInvoker.
impl<T: InvocationPipeline> DynInvoker for T {
    fn name(&self) -> &str {
        InvocationPipeline::name(self)
    }

    fn apply_dyn<'a>(&'a self, envelope: &'a EventEnvelope) -> InvocationFuture<'a> {
        Box::pin(self.apply(envelope))
    }
}

/// Function name to invoker lookup, filled by the external loader.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn DynInvoker>>,
}

impl FunctionRegistry {
    /// Start an empty builder.
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::new()
    }

    /// The invoker registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DynInvoker>> {
        self.functions.get(name)
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no function is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Builder for constructing a [`FunctionRegistry`].
#[derive(Default)]
pub struct FunctionRegistryBuilder {
    functions: HashMap<String, Arc<dyn DynInvoker>>,
}

impl FunctionRegistryBuilder {
    /// Create a new empty registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register<P: InvocationPipeline>(self, pipeline: P) -> Self {
        self.register_shared(Arc::new(pipeline))
    }

    /// Register an already shared invoker.
    pub fn register_shared(mut self, invoker: Arc<dyn DynInvoker>) -> Self {
        let name = invoker.name().to_string();
        if self.functions.insert(name.clone(), invoker).is_some() {
            warn!(function = %name, "function registered twice; keeping the later one");
        }
        self
    }

    /// Build the registry.
    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}
