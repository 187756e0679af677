//! # Shapes
//!
//! A shape is the declared type of a handler's payload or return value.
//! Rather than inspecting types at runtime, every shape states at compile time
//! which codec bindings it declares and which member shapes it is built from.
//! Codecs answer "must I own this shape?" by walking that declaration.
//!
//! A shape also carries a [`Layout`] telling key-rewriting codecs which JSON
//! object keys are field names and which are data (map keys, raw values).
//!
//! Implement [`Shape`] with `#[derive(Shape)]` from the facade crate, or by
//! hand:
//!
//! ```rust,ignore
//! impl Shape for Account {
//!     fn shape() -> ShapeInfo {
//!         ShapeInfo::record::<Self>(&["camel_case"], &["name"], || vec![String::shape()])
//!     }
//! }
//! ```

use bytes::Bytes;
use std::{
    any::{TypeId, type_name},
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

/// Compile-time description of a payload or return type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Shape`",
    label = "missing `Shape` implementation",
    note = "Derive it with `#[derive(Shape)]` or implement `Shape::shape` by hand."
)]
pub trait Shape: 'static {
    /// Describes this type.
    fn shape() -> ShapeInfo;
}

/// How a shape's value sits in JSON.
///
/// Members are the ones returned by [`ShapeInfo::members`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No object key inside is a field name.
    Opaque,
    /// Serialized as its only member (`Option`, `Box`, newtypes).
    Transparent,
    /// An array of the only member.
    Sequence,
    /// An object whose keys are data and whose values are the only member.
    Map,
    /// An object keyed by these field names, aligned with the members.
    Record(&'static [&'static str]),
    /// An array whose items are aligned with the members.
    Tuple,
    /// An externally tagged enum.
    Variants(&'static [Variant]),
}

/// One variant of a [`Layout::Variants`] enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    /// Tag as it appears on the wire.
    pub name: &'static str,
    /// Field names of a struct variant; empty for tuple and unit variants.
    pub fields: &'static [&'static str],
    /// Index of the variant's first member.
    pub first: usize,
    /// Number of members the variant owns.
    pub len: usize,
}

impl Variant {
    /// The slice of `members` this variant owns.
    pub fn members<'a>(&self, members: &'a [ShapeInfo]) -> &'a [ShapeInfo] {
        members
            .get(self.first..self.first + self.len)
            .unwrap_or_default()
    }
}

/// The description produced by [`Shape::shape`].
#[derive(Clone, Copy)]
pub struct ShapeInfo {
    type_id: TypeId,
    name: &'static str,
    bindings: &'static [&'static str],
    members: fn() -> Vec<ShapeInfo>,
    layout: Layout,
}

/// Stands in for a member excluded with `#[shape(skip)]`.
enum Skipped {}

impl ShapeInfo {
    /// Describes `T` with the given bindings and members and an
    /// [`Opaque`](Layout::Opaque) layout.
    ///
    /// `members` is evaluated lazily so recursive types can be described.
    pub fn new<T: 'static + ?Sized>(
        bindings: &'static [&'static str],
        members: fn() -> Vec<ShapeInfo>,
    ) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            bindings,
            members,
            layout: Layout::Opaque,
        }
    }

    /// Describes a struct with named fields, aligned with `members`.
    pub fn record<T: 'static + ?Sized>(
        bindings: &'static [&'static str],
        fields: &'static [&'static str],
        members: fn() -> Vec<ShapeInfo>,
    ) -> Self {
        Self::new::<T>(bindings, members).with_layout(Layout::Record(fields))
    }

    /// Describes a leaf type with no bindings and no members.
    pub fn leaf<T: 'static + ?Sized>() -> Self {
        Self::new::<T>(&[], Vec::new)
    }

    /// Placeholder for a member whose type is not described.
    pub fn skipped() -> Self {
        Self::leaf::<Skipped>()
    }

    /// Replaces the layout.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// How values of this shape are laid out in JSON.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Identity of the described type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the described type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bindings declared directly on this type.
    pub fn bindings(&self) -> &'static [&'static str] {
        self.bindings
    }

    /// Member shapes, in declaration order.
    pub fn members(&self) -> Vec<ShapeInfo> {
        (self.members)()
    }

    /// Whether this shape or any shape reachable from it declares `binding`.
    pub fn declares(&self, binding: &str) -> bool {
        let mut seen = HashSet::new();
        self.walk(binding, &mut seen)
    }

    fn walk(&self, binding: &str, seen: &mut HashSet<TypeId>) -> bool {
        if !seen.insert(self.type_id) {
            return false;
        }
        if self.bindings.contains(&binding) {
            return true;
        }
        self.members().iter().any(|m| m.walk(binding, seen))
    }
}

impl fmt::Debug for ShapeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeInfo")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ShapeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ShapeInfo {}

macro_rules! impl_leaf_shape {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Shape for $t {
                fn shape() -> ShapeInfo {
                    ShapeInfo::leaf::<$t>()
                }
            }
        )+
    };
}

impl_leaf_shape!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    Bytes,
    serde_json::Value,
    chrono::DateTime<chrono::Utc>,
);

fn element_of<T: Shape>() -> Vec<ShapeInfo> {
    vec![T::shape()]
}

macro_rules! impl_container_shape {
    ($($t:ident => $layout:ident),+ $(,)?) => {
        $(
            impl<T: Shape> Shape for $t<T> {
                fn shape() -> ShapeInfo {
                    ShapeInfo::new::<Self>(&[], element_of::<T>).with_layout(Layout::$layout)
                }
            }
        )+
    };
}

impl_container_shape!(Option => Transparent, Box => Transparent, Vec => Sequence);

impl<T: Shape> Shape for HashMap<String, T> {
    fn shape() -> ShapeInfo {
        ShapeInfo::new::<Self>(&[], element_of::<T>).with_layout(Layout::Map)
    }
}

impl<T: Shape> Shape for BTreeMap<String, T> {
    fn shape() -> ShapeInfo {
        ShapeInfo::new::<Self>(&[], element_of::<T>).with_layout(Layout::Map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Contact;
    struct Account;
    struct Node;

    impl Shape for Contact {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&["camel_case"], &["name"], || vec![String::shape()])
        }
    }

    impl Shape for Account {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&[], &["name", "contacts"], || {
                vec![String::shape(), Vec::<Contact>::shape()]
            })
        }
    }

    impl Shape for Node {
        fn shape() -> ShapeInfo {
            ShapeInfo::new::<Self>(&[], || vec![Vec::<Node>::shape(), Option::<Box<Node>>::shape()])
        }
    }

    #[test]
    fn test_direct_binding() {
        assert!(Contact::shape().declares("camel_case"));
        assert!(!Contact::shape().declares("kebab_case"));
    }

    #[test]
    fn test_binding_found_through_members() {
        assert!(Account::shape().declares("camel_case"));
        assert!(Vec::<Account>::shape().declares("camel_case"));
        assert!(!String::shape().declares("camel_case"));
    }

    #[test]
    fn test_recursive_shape_terminates() {
        assert!(!Node::shape().declares("camel_case"));
    }

    #[test]
    fn test_equality_by_type() {
        assert_eq!(Vec::<Contact>::shape(), Vec::<Contact>::shape());
        assert_ne!(Vec::<Contact>::shape(), Contact::shape());
        assert!(Vec::<Contact>::shape().name().contains("Vec"));
    }

    #[test]
    fn test_layouts() {
        assert_eq!(String::shape().layout(), Layout::Opaque);
        assert_eq!(Option::<String>::shape().layout(), Layout::Transparent);
        assert_eq!(Vec::<Contact>::shape().layout(), Layout::Sequence);
        assert_eq!(BTreeMap::<String, u32>::shape().layout(), Layout::Map);
        assert_eq!(Account::shape().layout(), Layout::Record(&["name", "contacts"]));
        assert!(!ShapeInfo::skipped().declares("camel_case"));
    }

    #[test]
    fn test_variant_members() {
        let variant = Variant {
            name: "Pair",
            fields: &[],
            first: 1,
            len: 2,
        };
        let members = [String::shape(), u32::shape(), u64::shape()];
        assert_eq!(variant.members(&members), &[u32::shape(), u64::shape()]);
        assert!(variant.members(&members[..2]).is_empty());
    }
}
