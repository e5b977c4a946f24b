//! Array append and delete.
//!
//! Both operations check before they act: a refused call leaves the
//! document untouched. Callers re-flatten afterwards, since a delete shifts
//! the indices of every later sibling.

use serde_json::Value;

use crate::{
    data::{
        defaults::synthesize,
        pointer::{Pointer, parse_index},
        resolver::resolve,
        schema::SchemaNode,
        types::SchemaType,
    },
    error::{ConfigError, Result},
};

/// Append one synthesized element to the array at `pointer`.
///
/// Returns the pointer of the new element.
///
/// # Errors
///
/// - [`ConfigError::TypeMismatch`] if `pointer` does not resolve to an array
///   schema, or the document holds something other than an array there.
/// - [`ConfigError::NotFound`] if the document has no node at `pointer`.
pub fn append(document: &mut Value, schema: &SchemaNode, pointer: &Pointer) -> Result<Pointer> {
    let sub = resolve(schema, pointer);
    let Some(items) = sub.items() else {
        return Err(ConfigError::TypeMismatch {
            pointer: pointer.to_string(),
            expected: "array schema".into(),
            actual: sub.schema_type().to_string(),
        });
    };

    let target = pointer
        .get_mut(document)
        .ok_or_else(|| ConfigError::not_found(format!("array {pointer}")))?;
    let actual = SchemaType::name_of(target);
    let Value::Array(arr) = target else {
        return Err(ConfigError::TypeMismatch {
            pointer: pointer.to_string(),
            expected: SchemaType::Array.to_string(),
            actual: actual.to_string(),
        });
    };

    arr.push(synthesize(items));
    let added = pointer.index(arr.len() - 1);
    debug!("appended {added}");
    Ok(added)
}

/// Remove the array element at `pointer`, shifting later elements down.
///
/// Returns the pointer of the parent array, which is where a selection
/// should move since `pointer` itself may no longer exist.
///
/// # Errors
///
/// - [`ConfigError::NotFound`] if the parent is not an array in the
///   document, or the index is out of range.
/// - [`ConfigError::CardinalityViolation`] if the array is already at or
///   below its `minItems`.
pub fn remove(document: &mut Value, schema: &SchemaNode, pointer: &Pointer) -> Result<Pointer> {
    let not_found = || ConfigError::not_found(format!("array element {pointer}"));

    let parent = pointer.parent().ok_or_else(not_found)?;
    let index = pointer.last().and_then(parse_index).ok_or_else(not_found)?;
    let min_items = resolve(schema, &parent).min_items();

    let arr = parent
        .get_mut(document)
        .and_then(Value::as_array_mut)
        .ok_or_else(not_found)?;
    if index >= arr.len() {
        return Err(not_found());
    }
    if arr.len() <= min_items {
        return Err(ConfigError::CardinalityViolation {
            pointer: pointer.to_string(),
            len: arr.len(),
            min_items,
        });
    }

    arr.remove(index);
    debug!("removed {pointer}, {} item(s) left", arr.len());
    Ok(parent)
}
