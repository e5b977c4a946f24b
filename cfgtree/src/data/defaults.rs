//! Default document synthesis.
//!
//! [`synthesize`] builds the smallest document the schema describes and is
//! total: unsupported or malformed subschemas produce `null` instead of an
//! error, because it backs config creation and array appends.

use serde_json::{Map, Value};

use crate::data::schema::{Leaf, LeafKind, SchemaKind, SchemaNode};

/// Build a default value for `schema`.
///
/// - object: every property, in declaration order
/// - array: `minItems` synthesized elements
/// - string: `default`, else the first `enum` value, else `""`
/// - integer/number: `default`, else first `enum` value, else `minimum`, else `0`
/// - boolean: `default`, else first `enum` value, else `false`
/// - anything else: `null`
pub fn synthesize(schema: &SchemaNode) -> Value {
    match &schema.kind {
        SchemaKind::Object { properties } => Value::Object(
            properties
                .iter()
                .map(|(key, sub)| (key.clone(), synthesize(sub)))
                .collect::<Map<String, Value>>(),
        ),
        SchemaKind::Array { items, min_items } => {
            Value::Array((0..*min_items).map(|_| synthesize(items)).collect())
        }
        SchemaKind::Leaf(leaf) => leaf_default(leaf),
        SchemaKind::Unknown => Value::Null,
    }
}

fn leaf_default(leaf: &Leaf) -> Value {
    if let Some(default) = &leaf.default {
        return default.clone();
    }
    if let Some(first) = leaf.enum_values.as_ref().and_then(|v| v.first()) {
        return first.clone();
    }
    match leaf.kind {
        LeafKind::String => Value::String(String::new()),
        LeafKind::Integer | LeafKind::Number => {
            leaf.minimum.clone().unwrap_or_else(|| Value::from(0))
        }
        LeafKind::Boolean => Value::Bool(false),
    }
}

/// Insert synthesized values for object properties missing from `document`.
///
/// Recurses through present objects and array elements. Arrays are never
/// padded: `minItems` is a floor on deletion, not on loading. Returns how
/// many values were inserted.
pub fn fill_missing(document: &mut Value, schema: &SchemaNode) -> usize {
    match (&schema.kind, document) {
        (SchemaKind::Object { properties }, Value::Object(map)) => {
            let mut inserted = 0;
            for (key, sub) in properties {
                match map.get_mut(key) {
                    Some(child) => inserted += fill_missing(child, sub),
                    None => {
                        map.insert(key.clone(), synthesize(sub));
                        inserted += 1;
                    }
                }
            }
            inserted
        }
        (SchemaKind::Array { items, .. }, Value::Array(arr)) => arr
            .iter_mut()
            .map(|element| fill_missing(element, items))
            .sum(),
        _ => 0,
    }
}
