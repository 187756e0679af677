//! Built-in codecs.
//!
//! - [`SerdeJsonCodec`] - plain `serde_json`, the default fallback
//! - [`KeyCaseCodec`] - rewrites field names between `snake_case` and a wire
//!   case (`camel_case`, `kebab_case`, `pascal_case` bindings)

mod json;
mod key_case;

pub use self::json::SerdeJsonCodec;
pub use self::key_case::{KeyCase, KeyCaseCodec};
