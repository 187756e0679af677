//! Codec registry with memoized per-shape resolution.
//!
//! Every registered codec is asked independently whether it must own a
//! shape. One claim selects that codec, no claim selects the fallback, and
//! two or more claims are an [`AmbiguousCodecError`].
//!
//! Results are cached per [`TypeId`]. Two threads resolving the same shape
//! at once compute the same answer, so the cache only needs an idempotent
//! insert.

use crate::codecs::{KeyCaseCodec, SerdeJsonCodec};
use dashmap::DashMap;
use fxrun_core::{AmbiguousCodecError, Codec, ShapeInfo};
use std::{any::TypeId, sync::Arc};
use tracing::debug;

#[derive(Clone)]
enum Resolution {
    Codec(Arc<dyn Codec>),
    Ambiguous(Vec<&'static str>),
}

/// The set of available codecs plus a designated fallback.
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Codec>>,
    fallback: Arc<dyn Codec>,
    resolved: DashMap<TypeId, Resolution>,
}

impl CodecRegistry {
    /// Starts an empty builder.
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::new()
    }

    /// Selects the codec for `shape`.
    pub fn resolve(&self, shape: &ShapeInfo) -> Result<Arc<dyn Codec>, AmbiguousCodecError> {
        let id = shape.type_id();
        let cached = self.resolved.get(&id).map(|hit| hit.value().clone());
        let resolution = match cached {
            Some(resolution) => resolution,
            None => {
                let fresh = self.inspect(shape);
                self.resolved.entry(id).or_insert(fresh).value().clone()
            }
        };

        match resolution {
            Resolution::Codec(codec) => Ok(codec),
            Resolution::Ambiguous(codecs) => Err(AmbiguousCodecError {
                shape: shape.name(),
                codecs,
            }),
        }
    }

    fn inspect(&self, shape: &ShapeInfo) -> Resolution {
        let claims: Vec<&Arc<dyn Codec>> = self
            .codecs
            .iter()
            .filter(|codec| codec.applies_to(shape))
            .collect();

        let resolution = match claims.as_slice() {
            [] => Resolution::Codec(Arc::clone(&self.fallback)),
            [only] => Resolution::Codec(Arc::clone(only)),
            _ => Resolution::Ambiguous(claims.iter().map(|codec| codec.name()).collect()),
        };

        match &resolution {
            Resolution::Codec(codec) => {
                debug!(shape = shape.name(), codec = codec.name(), "resolved codec");
            }
            Resolution::Ambiguous(codecs) => {
                debug!(shape = shape.name(), ?codecs, "ambiguous codec claims");
            }
        }
        resolution
    }

    /// Names of the registered non-fallback codecs, in registration order.
    pub fn codec_names(&self) -> Vec<&'static str> {
        self.codecs.iter().map(|codec| codec.name()).collect()
    }

    /// The fallback codec.
    pub fn fallback(&self) -> &Arc<dyn Codec> {
        &self.fallback
    }

    /// Number of memoized resolutions.
    pub fn cached_len(&self) -> usize {
        self.resolved.len()
    }
}

impl Default for CodecRegistry {
    /// The serde fallback plus the `camel_case` and `kebab_case` codecs.
    fn default() -> Self {
        CodecRegistryBuilder::new()
            .register(KeyCaseCodec::camel_case())
            .register(KeyCaseCodec::kebab_case())
            .build()
    }
}

/// Builder for constructing a [`CodecRegistry`].
pub struct CodecRegistryBuilder {
    codecs: Vec<Arc<dyn Codec>>,
    fallback: Option<Arc<dyn Codec>>,
}

impl Default for CodecRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistryBuilder {
    /// Create a new empty registry builder.
    pub fn new() -> Self {
        Self {
            codecs: Vec::new(),
            fallback: None,
        }
    }

    /// Register a codec that may claim shapes.
    pub fn register<C: Codec>(self, codec: C) -> Self {
        self.register_shared(Arc::new(codec))
    }

    /// Register an already shared codec.
    pub fn register_shared(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codecs.push(codec);
        self
    }

    /// Replace the fallback codec (default: [`SerdeJsonCodec`]).
    pub fn fallback<C: Codec>(mut self, codec: C) -> Self {
        self.fallback = Some(Arc::new(codec));
        self
    }

    /// Register every codec submitted with `inventory::submit!`.
    #[cfg(feature = "inventory")]
    pub fn discover(mut self) -> Self {
        for registration in inventory::iter::<CodecRegistration> {
            self.codecs.push((registration.codec)());
        }
        self
    }

    /// Build the registry.
    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            codecs: self.codecs,
            fallback: self.fallback.unwrap_or_else(|| Arc::new(SerdeJsonCodec)),
            resolved: DashMap::new(),
        }
    }
}

/// A codec provider discoverable by [`CodecRegistryBuilder::discover`].
///
/// ```rust,ignore
/// inventory::submit! {
///     fxrun_std::CodecRegistration { codec: || std::sync::Arc::new(MyCodec) }
/// }
/// ```
#[cfg(feature = "inventory")]
pub struct CodecRegistration {
    /// Creates the codec instance.
    pub codec: fn() -> Arc<dyn Codec>,
}

#[cfg(feature = "inventory")]
inventory::collect!(CodecRegistration);
