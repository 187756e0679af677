use fxrun_core::{Codec, CodecError, Layout, ShapeInfo, Variant};
use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde_json::{Map, Value};

/// The key convention a [`KeyCaseCodec`] speaks on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    /// `accountName`
    Camel,
    /// `account-name`
    Kebab,
    /// `AccountName`
    Pascal,
}

impl KeyCase {
    fn binding(self) -> &'static str {
        match self {
            KeyCase::Camel => "camel_case",
            KeyCase::Kebab => "kebab_case",
            KeyCase::Pascal => "pascal_case",
        }
    }

    fn to_wire(self, key: &str) -> String {
        match self {
            KeyCase::Camel => key.to_lower_camel_case(),
            KeyCase::Kebab => key.to_kebab_case(),
            KeyCase::Pascal => key.to_upper_camel_case(),
        }
    }
}

/// Maps field names between Rust `snake_case` and a wire convention.
///
/// The value tree is walked alongside the target shape's [`Layout`]. Keys of
/// record objects are renamed (to `snake_case` on decode, to the wire case on
/// encode); map keys, enum tags and anything under an opaque shape such as
/// `serde_json::Value` are data and stay as they are.
#[derive(Debug, Clone, Copy)]
pub struct KeyCaseCodec {
    case: KeyCase,
}

impl KeyCaseCodec {
    /// Owns shapes marked with the binding of `case`.
    pub const fn new(case: KeyCase) -> Self {
        Self { case }
    }

    /// Owns shapes marked `camel_case`.
    pub const fn camel_case() -> Self {
        Self::new(KeyCase::Camel)
    }

    /// Owns shapes marked `kebab_case`.
    pub const fn kebab_case() -> Self {
        Self::new(KeyCase::Kebab)
    }

    /// Owns shapes marked `pascal_case`.
    pub const fn pascal_case() -> Self {
        Self::new(KeyCase::Pascal)
    }

    /// The wire convention this codec speaks.
    pub fn case(&self) -> KeyCase {
        self.case
    }
}

type Rename<'a> = &'a dyn Fn(&str) -> String;

fn rewrite(value: Value, shape: &ShapeInfo, rename: Rename<'_>) -> Value {
    match (shape.layout(), value) {
        (Layout::Transparent, value) => match shape.members().first() {
            Some(inner) => rewrite(value, inner, rename),
            None => value,
        },
        (Layout::Sequence, Value::Array(items)) => match shape.members().first() {
            Some(element) => Value::Array(
                items
                    .into_iter()
                    .map(|item| rewrite(item, element, rename))
                    .collect(),
            ),
            None => Value::Array(items),
        },
        (Layout::Map, Value::Object(entries)) => match shape.members().first() {
            Some(element) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, entry)| (key, rewrite(entry, element, rename)))
                    .collect(),
            ),
            None => Value::Object(entries),
        },
        (Layout::Record(fields), Value::Object(entries)) => {
            Value::Object(rewrite_record(entries, fields, &shape.members(), rename))
        }
        (Layout::Tuple, Value::Array(items)) => {
            Value::Array(rewrite_tuple(items, &shape.members(), rename))
        }
        (Layout::Variants(variants), Value::Object(tagged)) => {
            let members = shape.members();
            let rewritten = tagged
                .into_iter()
                .map(|(tag, inner)| {
                    let inner = match variants.iter().find(|v| v.name == tag) {
                        Some(variant) => rewrite_variant(inner, variant, &members, rename),
                        None => inner,
                    };
                    (tag, inner)
                })
                .collect();
            Value::Object(rewritten)
        }
        (_, value) => value,
    }
}

fn rewrite_record(
    entries: Map<String, Value>,
    fields: &[&str],
    members: &[ShapeInfo],
    rename: Rename<'_>,
) -> Map<String, Value> {
    let mut renamed = Map::with_capacity(entries.len());
    for (key, entry) in entries {
        let new_key = rename(&key);
        // Decoding looks fields up by the renamed key, encoding by the original.
        let member = fields
            .iter()
            .position(|field| *field == new_key || *field == key)
            .and_then(|index| members.get(index));
        let entry = match member {
            Some(member) => rewrite(entry, member, rename),
            None => entry,
        };
        renamed.insert(new_key, entry);
    }
    renamed
}

fn rewrite_tuple(items: Vec<Value>, members: &[ShapeInfo], rename: Rename<'_>) -> Vec<Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match members.get(index) {
            Some(member) => rewrite(item, member, rename),
            None => item,
        })
        .collect()
}

fn rewrite_variant(
    inner: Value,
    variant: &Variant,
    members: &[ShapeInfo],
    rename: Rename<'_>,
) -> Value {
    let owned = variant.members(members);
    match (variant.fields, owned, inner) {
        ([], [only], inner) => rewrite(inner, only, rename),
        ([], _, Value::Array(items)) => Value::Array(rewrite_tuple(items, owned, rename)),
        (fields, _, Value::Object(entries)) if !fields.is_empty() => {
            Value::Object(rewrite_record(entries, fields, owned, rename))
        }
        (_, _, inner) => inner,
    }
}

impl Codec for KeyCaseCodec {
    fn name(&self) -> &'static str {
        self.case.binding()
    }

    fn binding(&self) -> Option<&'static str> {
        Some(self.case.binding())
    }

    fn decode(&self, json: &str, shape: &ShapeInfo) -> Result<Value, CodecError> {
        let value: Value = serde_json::from_str(json).map_err(CodecError::Syntax)?;
        Ok(rewrite(value, shape, &|k| k.to_snake_case()))
    }

    fn encode(&self, value: Value, shape: &ShapeInfo) -> Result<String, CodecError> {
        let case = self.case;
        let value = rewrite(value, shape, &|k| case.to_wire(k));
        serde_json::to_string(&value).map_err(|source| CodecError::Encode {
            shape: shape.name(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxrun_core::Shape;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Address;
    struct Account;
    struct Contact;
    struct Inventory;
    enum Event {}

    impl Shape for Address {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&[], &["postal_code"], || vec![String::shape()])
        }
    }

    impl Shape for Contact {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&[], &["first_name"], || vec![String::shape()])
        }
    }

    impl Shape for Account {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(
                &["camel_case"],
                &["account_name", "billing_address", "contacts", "extra"],
                || {
                    vec![
                        String::shape(),
                        Option::<Address>::shape(),
                        Vec::<Contact>::shape(),
                        Value::shape(),
                    ]
                },
            )
        }
    }

    impl Shape for Inventory {
        fn shape() -> ShapeInfo {
            ShapeInfo::record::<Self>(&["camel_case"], &["warehouse_name", "stock", "bins"], || {
                vec![
                    String::shape(),
                    BTreeMap::<String, u32>::shape(),
                    BTreeMap::<String, Address>::shape(),
                ]
            })
        }
    }

    impl Shape for Event {
        fn shape() -> ShapeInfo {
            const VARIANTS: &[Variant] = &[
                Variant {
                    name: "Moved",
                    fields: &["new_address", "moved_by"],
                    first: 0,
                    len: 2,
                },
                Variant {
                    name: "Tagged",
                    fields: &[],
                    first: 2,
                    len: 1,
                },
            ];
            ShapeInfo::new::<Self>(&[], || {
                vec![Address::shape(), String::shape(), BTreeMap::<String, u32>::shape()]
            })
            .with_layout(Layout::Variants(VARIANTS))
        }
    }

    #[test]
    fn test_decode_to_snake_case() {
        let codec = KeyCaseCodec::camel_case();
        let value = codec
            .decode(
                r#"{"accountName": "Acme", "billingAddress": {"postalCode": "94105"}}"#,
                &Account::shape(),
            )
            .unwrap();
        assert_eq!(
            value,
            json!({"account_name": "Acme", "billing_address": {"postal_code": "94105"}})
        );
    }

    #[test]
    fn test_encode_to_wire_case() {
        let value = json!({"account_name": "Acme", "contacts": [{"first_name": "Ada"}]});
        let shape = Account::shape();

        let camel = KeyCaseCodec::camel_case().encode(value.clone(), &shape).unwrap();
        assert_eq!(camel, r#"{"accountName":"Acme","contacts":[{"firstName":"Ada"}]}"#);

        let kebab = KeyCaseCodec::kebab_case().encode(value.clone(), &shape).unwrap();
        assert_eq!(kebab, r#"{"account-name":"Acme","contacts":[{"first-name":"Ada"}]}"#);

        let pascal = KeyCaseCodec::pascal_case().encode(value, &shape).unwrap();
        assert_eq!(pascal, r#"{"AccountName":"Acme","Contacts":[{"FirstName":"Ada"}]}"#);
    }

    #[test]
    fn test_map_keys_are_data() {
        let codec = KeyCaseCodec::camel_case();
        let shape = Inventory::shape();
        let wire = concat!(
            r#"{"warehouseName":"W1","stock":{"SKU-A1":3,"sku_b":4},"#,
            r#""bins":{"Bin-7":{"postalCode":"1"}}}"#,
        );

        let decoded = codec.decode(wire, &shape).unwrap();
        assert_eq!(
            decoded,
            json!({
                "warehouse_name": "W1",
                "stock": {"SKU-A1": 3, "sku_b": 4},
                "bins": {"Bin-7": {"postal_code": "1"}}
            })
        );

        let encoded = codec.encode(decoded, &shape).unwrap();
        let sent: Value = serde_json::from_str(wire).unwrap();
        let got: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(sent, got);
    }

    #[test]
    fn test_opaque_values_untouched() {
        let codec = KeyCaseCodec::camel_case();
        let decoded = codec
            .decode(r#"{"accountName": "A", "extra": {"someKey": 1}}"#, &Account::shape())
            .unwrap();
        assert_eq!(decoded, json!({"account_name": "A", "extra": {"someKey": 1}}));
    }

    #[test]
    fn test_enum_tags_kept() {
        let codec = KeyCaseCodec::kebab_case();
        let shape = Event::shape();

        let moved = codec
            .decode(
                r#"{"Moved": {"new-address": {"postal-code": "9"}, "moved-by": "ops"}}"#,
                &shape,
            )
            .unwrap();
        assert_eq!(
            moved,
            json!({"Moved": {"new_address": {"postal_code": "9"}, "moved_by": "ops"}})
        );

        let tagged = codec.decode(r#"{"Tagged": {"Hot-Item": 1}}"#, &shape).unwrap();
        assert_eq!(tagged, json!({"Tagged": {"Hot-Item": 1}}));
    }

    #[test]
    fn test_bindings() {
        assert_eq!(KeyCaseCodec::camel_case().binding(), Some("camel_case"));
        assert_eq!(KeyCaseCodec::kebab_case().name(), "kebab_case");
        assert_eq!(KeyCaseCodec::new(KeyCase::Pascal).case(), KeyCase::Pascal);
    }
}
