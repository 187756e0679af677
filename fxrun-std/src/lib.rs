//! # fxrun-std
//!
//! Standard implementations for the fxrun function invocation host.
//!
//! This crate provides:
//! - **Context decoding**: [`decoder`] for the base64 JSON context extensions
//! - **Codecs**: [`SerdeJsonCodec`] (the fallback) and [`KeyCaseCodec`]
//! - **Codec resolution**: [`CodecRegistry`]
//! - **Marshalling**: the raw, text, list and [`Json`] strategies in [`marshal`]
//! - **Context initialization**: [`SdkContextInitializer`]
//! - **Test fixtures**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core contracts
pub use fxrun_core;

// Modules
pub mod codecs;
pub mod decoder;
pub mod initializer;
pub mod marshal;
pub mod registry;
pub mod testing;

pub use codecs::{KeyCase, KeyCaseCodec, SerdeJsonCodec};
pub use initializer::{ContextInitError, SdkContextInitializer};
pub use marshal::{Json, Output, Payload, PayloadUnmarshaller, ResultMarshaller, Strategy};
pub use registry::{CodecRegistry, CodecRegistryBuilder};

#[cfg(feature = "inventory")]
pub use registry::CodecRegistration;

#[cfg(feature = "inventory")]
pub use inventory;
