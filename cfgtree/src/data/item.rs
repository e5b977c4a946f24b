//! Edit input parsing and in-place value writes.
//!
//! A renderer collects text from whatever widget the node's
//! [`Affordance`] suggests; this module turns that text into a value and
//! writes it at a pointer without touching unrelated subtrees.

use serde_json::{Number, Value};

use crate::{
    data::{
        pointer::Pointer,
        schema::SchemaNode,
        types::{Affordance, SchemaType},
    },
    error::{ConfigError, Result},
};

/// Initial editor text for a value: raw text for strings, compact JSON
/// for everything else.
pub fn edit_buffer(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Display text of an enum member, as offered to and matched against input.
pub fn enum_label(value: &Value) -> String {
    edit_buffer(value)
}

/// Convert user input into a value for the node governed by `schema`.
///
/// # Errors
///
/// Returns [`ConfigError::TypeMismatch`] when the input does not fit the
/// node's affordance.
pub fn parse_input(schema: &SchemaNode, pointer: &Pointer, input: &str) -> Result<Value> {
    let mismatch = |expected: String| ConfigError::TypeMismatch {
        pointer: pointer.to_string(),
        expected,
        actual: input.to_string(),
    };

    match schema.affordance() {
        Affordance::String => Ok(Value::String(input.to_string())),
        Affordance::Boolean => match input.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch("boolean (true or false)".into())),
        },
        Affordance::Integer => {
            let text = input.trim();
            if let Ok(i) = text.parse::<i64>() {
                Ok(Value::from(i))
            } else if let Ok(u) = text.parse::<u64>() {
                Ok(Value::from(u))
            } else {
                Err(mismatch("integer".into()))
            }
        }
        Affordance::Number => serde_json::from_str::<Number>(input.trim())
            .map(Value::Number)
            .map_err(|_| mismatch("number".into())),
        Affordance::Enum(variants) => variants
            .iter()
            .find(|v| enum_label(v) == input)
            .cloned()
            .ok_or_else(|| {
                let labels: Vec<String> = variants.iter().map(enum_label).collect();
                mismatch(format!("one of: {}", labels.join(", ")))
            }),
        Affordance::Json => {
            let value: Value =
                serde_json::from_str(input).map_err(|_| mismatch("valid JSON".into()))?;
            let ty = schema.schema_type();
            if matches!(ty, SchemaType::Object | SchemaType::Array) && !ty.matches(&value) {
                return Err(ConfigError::TypeMismatch {
                    pointer: pointer.to_string(),
                    expected: ty.to_string(),
                    actual: SchemaType::name_of(&value).to_string(),
                });
            }
            Ok(value)
        }
    }
}

/// Write `value` at `pointer`, in place.
///
/// A missing key is inserted when its parent is an existing object. The
/// root pointer replaces the whole document.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when neither the node nor an object
/// parent exists.
pub fn set_value(document: &mut Value, pointer: &Pointer, value: Value) -> Result<()> {
    if let Some(slot) = pointer.get_mut(document) {
        *slot = value;
        return Ok(());
    }

    let (Some(parent), Some(key)) = (pointer.parent(), pointer.last()) else {
        return Err(ConfigError::not_found(format!("node {pointer}")));
    };
    match parent.get_mut(document) {
        Some(Value::Object(map)) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        _ => Err(ConfigError::not_found(format!("node {pointer}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(v: Value) -> SchemaNode {
        SchemaNode::parse(&v)
    }

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn test_parse_string_verbatim() {
        let schema = leaf(json!({"type": "string"}));
        assert_eq!(
            parse_input(&schema, &p("/a"), " spaced 42 ").unwrap(),
            json!(" spaced 42 ")
        );
    }

    #[test]
    fn test_parse_scalars() {
        let int = leaf(json!({"type": "integer"}));
        assert_eq!(parse_input(&int, &p("/n"), " 42 ").unwrap(), json!(42));
        assert_eq!(parse_input(&int, &p("/n"), "-7").unwrap(), json!(-7));
        assert!(matches!(
            parse_input(&int, &p("/n"), "4.5"),
            Err(ConfigError::TypeMismatch { .. })
        ));

        let num = leaf(json!({"type": "number"}));
        assert_eq!(parse_input(&num, &p("/x"), "4.5").unwrap(), json!(4.5));
        assert!(parse_input(&num, &p("/x"), "four").is_err());

        let boolean = leaf(json!({"type": "boolean"}));
        assert_eq!(parse_input(&boolean, &p("/b"), "true").unwrap(), json!(true));
        assert!(parse_input(&boolean, &p("/b"), "yes").is_err());
    }

    #[test]
    fn test_parse_enum() {
        let schema = leaf(json!({"type": "string", "enum": ["fast", "safe"]}));
        assert_eq!(parse_input(&schema, &p("/m"), "safe").unwrap(), json!("safe"));
        let err = parse_input(&schema, &p("/m"), "slow").unwrap_err();
        match err {
            ConfigError::TypeMismatch {
                pointer, expected, ..
            } => {
                assert_eq!(pointer, "/m");
                assert_eq!(expected, "one of: fast, safe");
            }
            other => panic!("unexpected error: {other}"),
        }

        let numeric = leaf(json!({"type": "integer", "enum": [1, 2]}));
        assert_eq!(parse_input(&numeric, &p("/m"), "2").unwrap(), json!(2));
    }

    #[test]
    fn test_parse_json() {
        let opaque = SchemaNode::UNKNOWN;
        assert_eq!(
            parse_input(&opaque, &p("/r"), r#"{"a": [1]}"#).unwrap(),
            json!({"a": [1]})
        );
        assert!(parse_input(&opaque, &p("/r"), "{oops").is_err());

        let arr = leaf(json!({"type": "array", "items": {"type": "string"}}));
        assert_eq!(parse_input(&arr, &p("/t"), r#"["a"]"#).unwrap(), json!(["a"]));
        let err = parse_input(&arr, &p("/t"), r#"{"a": 1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { ref actual, .. } if actual == "object"));
    }

    #[test]
    fn test_edit_buffer() {
        assert_eq!(edit_buffer(&json!("abc")), "abc");
        assert_eq!(edit_buffer(&json!([1, 2])), "[1,2]");
        assert_eq!(edit_buffer(&json!(null)), "null");
    }

    #[test]
    fn test_set_value_in_place() {
        let mut doc = json!({"keep": {"deep": [1, 2]}, "port": 1});
        set_value(&mut doc, &p("/port"), json!(8080)).unwrap();
        set_value(&mut doc, &p("/keep/deep/1"), json!(3)).unwrap();
        assert_eq!(doc, json!({"keep": {"deep": [1, 3]}, "port": 8080}));
    }

    #[test]
    fn test_set_value_inserts_missing_key() {
        let mut doc = json!({"a": {}});
        set_value(&mut doc, &p("/a/b"), json!(true)).unwrap();
        assert_eq!(doc, json!({"a": {"b": true}}));

        assert!(matches!(
            set_value(&mut doc, &p("/x/y"), json!(1)),
            Err(ConfigError::NotFound { .. })
        ));
        // 数组越界不会自动扩展
        let mut arr = json!({"l": [1]});
        assert!(set_value(&mut arr, &p("/l/5"), json!(1)).is_err());
    }

    #[test]
    fn test_set_root() {
        let mut doc = json!({"a": 1});
        set_value(&mut doc, &Pointer::root(), json!({"b": 2})).unwrap();
        assert_eq!(doc, json!({"b": 2}));
    }
}
