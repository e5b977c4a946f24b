//! Schema type and editor affordance definitions.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Declared type of a subschema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// `"type": "object"`.
    Object,
    /// `"type": "array"`.
    Array,
    /// `"type": "string"`.
    String,
    /// `"type": "integer"`.
    Integer,
    /// `"type": "number"`.
    Number,
    /// `"type": "boolean"`.
    Boolean,
    /// Missing or unsupported type; handled as opaque JSON.
    Unknown,
}

impl SchemaType {
    /// Keyword used by JSON Schema for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Unknown => "unknown",
        }
    }

    /// Scalar types that get a value preview in the node list.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SchemaType::String | SchemaType::Integer | SchemaType::Number | SchemaType::Boolean
        )
    }

    /// Whether `value` has the runtime shape this type describes.
    ///
    /// `Unknown` accepts anything.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::Object => value.is_object(),
            SchemaType::Array => value.is_array(),
            SchemaType::String => value.is_string(),
            SchemaType::Integer => value.is_i64() || value.is_u64(),
            SchemaType::Number => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Unknown => true,
        }
    }

    /// Name of the runtime type of a JSON value, for error messages.
    pub fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_f64() => "number",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which input widget a renderer should offer for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Affordance<'a> {
    /// Toggle.
    Boolean,
    /// Pick one of the listed values.
    Enum(&'a [Value]),
    /// Free text.
    String,
    /// Whole number input.
    Integer,
    /// Numeric input.
    Number,
    /// Raw JSON text (objects, arrays and untyped nodes).
    Json,
}

impl Affordance<'_> {
    /// Short name used in listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Affordance::Boolean => "boolean",
            Affordance::Enum(_) => "enum",
            Affordance::String => "string",
            Affordance::Integer => "integer",
            Affordance::Number => "number",
            Affordance::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matches() {
        assert!(SchemaType::Integer.matches(&json!(3)));
        assert!(!SchemaType::Integer.matches(&json!(3.5)));
        assert!(SchemaType::Number.matches(&json!(3)));
        assert!(SchemaType::Unknown.matches(&json!(null)));
        assert!(!SchemaType::String.matches(&json!(1)));
    }

    #[test]
    fn test_name_of() {
        assert_eq!(SchemaType::name_of(&json!(1)), "integer");
        assert_eq!(SchemaType::name_of(&json!(1.5)), "number");
        assert_eq!(SchemaType::name_of(&json!([])), "array");
    }
}
