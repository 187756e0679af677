//! # Handler Descriptors
//!
//! A [`HandlerDescriptor`] is the immutable binding of one handler to the
//! strategies and codecs chosen for its payload and return types. It is built
//! once, at setup time, and then shared read-only by every invocation.
//!
//! ```rust,ignore
//! let registry = CodecRegistry::default();
//! let descriptor = HandlerDescriptor::builder(upper)
//!     .name("upper")
//!     .build(&registry)?;
//!
//! let result = descriptor.apply(&envelope).await?;
//! ```
//!
//! Building fails with [`AmbiguousCodecError`] when more than one codec claims
//! either shape; such a handler is never registered.

use crate::config::PipelineConfig;
use fxrun_core::{AmbiguousCodecError, ContextInitializer, Handler, NoContext, Shape, ShapeInfo};
use fxrun_std::{CodecRegistry, Output, Payload, PayloadUnmarshaller, ResultMarshaller, Strategy};
use tracing::debug;

/// A handler bound to its unmarshaller, marshaller and context initializer.
pub struct HandlerDescriptor<H: Handler, I> {
    pub(crate) name: String,
    pub(crate) handler: H,
    pub(crate) initializer: I,
    pub(crate) unmarshaller: Box<dyn PayloadUnmarshaller<H::Payload>>,
    pub(crate) marshaller: Box<dyn ResultMarshaller<H::Output>>,
    pub(crate) config: PipelineConfig,
}

impl<H: Handler> HandlerDescriptor<H, NoContext> {
    /// Start describing `handler`.
    pub fn builder(handler: H) -> HandlerDescriptorBuilder<H, NoContext> {
        HandlerDescriptorBuilder {
            name: None,
            handler,
            initializer: NoContext,
            config: PipelineConfig::default(),
        }
    }
}

impl<H, I> HandlerDescriptor<H, I>
where
    H: Handler,
    H::Payload: Shape,
    H::Output: Shape,
{
    /// The function name used in logs and registry lookups.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared payload shape.
    pub fn payload_shape(&self) -> ShapeInfo {
        H::Payload::shape()
    }

    /// The declared return shape.
    pub fn output_shape(&self) -> ShapeInfo {
        H::Output::shape()
    }

    /// Strategy bound for the payload.
    pub fn payload_strategy(&self) -> Strategy {
        self.unmarshaller.strategy()
    }

    /// Strategy bound for the return value.
    pub fn output_strategy(&self) -> Strategy {
        self.marshaller.strategy()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Builder for [`HandlerDescriptor`].
pub struct HandlerDescriptorBuilder<H, I> {
    name: Option<String>,
    handler: H,
    initializer: I,
    config: PipelineConfig,
}

impl<H: Handler, I> HandlerDescriptorBuilder<H, I> {
    /// Set the function name (default: the handler's type name).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the context initializer for a two-argument handler.
    pub fn initializer<J: ContextInitializer>(
        self,
        initializer: J,
    ) -> HandlerDescriptorBuilder<H, J> {
        HandlerDescriptorBuilder {
            name: self.name,
            handler: self.handler,
            initializer,
            config: self.config,
        }
    }

    /// Replace the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }
}

impl<H, I> HandlerDescriptorBuilder<H, I>
where
    H: Handler<Context = I::Context>,
    H::Payload: Payload,
    H::Output: Output,
    I: ContextInitializer,
{
    /// Resolve codecs and bind the strategies.
    pub fn build(
        self,
        registry: &CodecRegistry,
    ) -> Result<HandlerDescriptor<H, I>, AmbiguousCodecError> {
        let unmarshaller = H::Payload::unmarshaller(registry)?;
        let marshaller = H::Output::marshaller(registry)?;
        let name = self.name.unwrap_or_else(short_type_name::<H>);

        debug!(
            function = %name,
            payload = H::Payload::shape().name(),
            payload_strategy = ?unmarshaller.strategy(),
            output = H::Output::shape().name(),
            output_strategy = ?marshaller.strategy(),
            "handler descriptor built"
        );

        Ok(HandlerDescriptor {
            name,
            handler: self.handler,
            initializer: self.initializer,
            unmarshaller,
            marshaller,
            config: self.config,
        })
    }
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path).to_string()
}
