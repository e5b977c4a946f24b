//! Pointer to subschema resolution.
//!
//! The walk is driven by the *schema's* declared type, not by the shape of
//! the token: an array schema descends into `items` whatever the token is,
//! because indices exist only in documents. Anything that cannot be
//! followed yields [`SchemaNode::UNKNOWN`] instead of an error, so editing
//! keeps working without type-specific affordances.

use serde_json::Value;

use crate::data::{
    pointer::Pointer,
    schema::{SchemaKind, SchemaNode},
    types::{Affordance, SchemaType},
};

static UNKNOWN_NODE: SchemaNode = SchemaNode::UNKNOWN;

/// Return the subschema governing `pointer`.
pub fn resolve<'s>(root: &'s SchemaNode, pointer: &Pointer) -> &'s SchemaNode {
    let mut current = root;
    for token in pointer.tokens() {
        current = match &current.kind {
            SchemaKind::Array { items, .. } => &**items,
            SchemaKind::Object { .. } => match current.property(token) {
                Some(sub) => sub,
                None => return &UNKNOWN_NODE,
            },
            SchemaKind::Leaf(_) | SchemaKind::Unknown => return &UNKNOWN_NODE,
        };
    }
    current
}

/// Declared type at `pointer`.
pub fn type_of(root: &SchemaNode, pointer: &Pointer) -> SchemaType {
    resolve(root, pointer).schema_type()
}

/// `enum` values at `pointer`, for leaf schemas that carry one.
pub fn enum_of<'s>(root: &'s SchemaNode, pointer: &Pointer) -> Option<&'s [Value]> {
    resolve(root, pointer).enum_values()
}

/// Description at `pointer`, or the "no description" sentinel.
pub fn description_of<'s>(root: &'s SchemaNode, pointer: &Pointer) -> &'s str {
    resolve(root, pointer).description()
}

/// `minItems` at `pointer`; 0 when absent or not an array.
pub fn min_items_of(root: &SchemaNode, pointer: &Pointer) -> usize {
    resolve(root, pointer).min_items()
}

/// Input widget for the node at `pointer`.
pub fn affordance_of<'s>(root: &'s SchemaNode, pointer: &Pointer) -> Affordance<'s> {
    resolve(root, pointer).affordance()
}
