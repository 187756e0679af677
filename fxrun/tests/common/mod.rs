#![allow(dead_code)]

use fxrun::{
    BoxError, CodecRegistry, Handler, HandlerDescriptor, InvocationPipeline, Shape, ShapeInfo,
    handler_fn,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Test Shapes
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub line_count: u32,
}

impl Shape for Order {
    fn shape() -> ShapeInfo {
        ShapeInfo::record::<Self>(&["camel_case"], &["order_id", "line_count"], || {
            vec![String::shape(), u32::shape()]
        })
    }
}

/// A `camel_case` record whose `stock` keys are SKUs, not field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub warehouse_name: String,
    pub stock: BTreeMap<String, u32>,
}

impl Shape for Inventory {
    fn shape() -> ShapeInfo {
        ShapeInfo::record::<Self>(&["camel_case"], &["warehouse_name", "stock"], || {
            vec![String::shape(), BTreeMap::<String, u32>::shape()]
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
}

impl Shape for Note {
    fn shape() -> ShapeInfo {
        ShapeInfo::record::<Self>(&[], &["text"], || vec![String::shape()])
    }
}

/// Claimed by both `camel_case` and `kebab_case`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contested {
    pub value: u32,
}

impl Shape for Contested {
    fn shape() -> ShapeInfo {
        ShapeInfo::record::<Self>(&["camel_case", "kebab_case"], &["value"], || vec![u32::shape()])
    }
}

/// Serializes to an error.
#[derive(Clone, Debug)]
pub struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot serialize this value"))
    }
}

impl Shape for Unserializable {
    fn shape() -> ShapeInfo {
        ShapeInfo::leaf::<Self>()
    }
}

// ============================================================================
// Test Handlers
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("order {0} is on hold")]
pub struct OnHold(pub String);

/// Binds `handler` with the default registry and configuration.
pub fn describe<H>(handler: H) -> impl InvocationPipeline
where
    H: Handler<Context = ()>,
    H::Payload: fxrun::Payload,
    H::Output: fxrun::Output,
{
    match HandlerDescriptor::builder(handler).build(&CodecRegistry::default()) {
        Ok(descriptor) => descriptor,
        Err(err) => panic!("descriptor should build: {err}"),
    }
}

/// The uppercasing text handler.
pub fn upper() -> impl InvocationPipeline {
    describe(handler_fn(|text: String| async move {
        Ok::<_, BoxError>(text.to_uppercase())
    }))
}
