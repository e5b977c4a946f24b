//! Document validation against the raw JSON Schema.
//!
//! Structural checks (types, `required`, `enum`, bounds, string formats) are
//! delegated to the `jsonschema` crate. This module's job is the report: every
//! violation carries the pointer of the offending node and a snapshot of its
//! value, so a front end can jump straight to it.
//!
//! Remote `$ref`s are refused rather than fetched.

use std::fmt;

use jsonschema::{Retrieve, Uri};
use serde::Serialize;
use serde_json::Value;

use crate::{
    data::pointer::Pointer,
    error::{ConfigError, Result},
};

/// Retriever that refuses every external schema reference.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("remote schema references are not supported: {}", uri.as_str()).into())
    }
}

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Pointer of the offending node in the document.
    pub pointer: Pointer,
    /// The offending value as it was at validation time.
    pub instance: Value,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.pointer.is_root() {
            "(root)".to_string()
        } else {
            self.pointer.to_string()
        };
        write!(
            f,
            "Validation error at {at} (value: {}): {}",
            self.instance, self.message
        )
    }
}

/// Every violation found in one validation run. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViolationReport {
    violations: Vec<Violation>,
}

impl ViolationReport {
    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// `true` when the document is valid.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations in validator order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Iterate over the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// First violation at or below `pointer`.
    pub fn first_under(&self, pointer: &Pointer) -> Option<&Violation> {
        self.violations
            .iter()
            .find(|v| v.pointer.tokens().starts_with(pointer.tokens()))
    }

    /// Consume the report.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ViolationReport {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl<'a> IntoIterator for &'a ViolationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {v}", i + 1)?;
        }
        Ok(())
    }
}

/// Validate `document` against the raw `schema`.
///
/// Neither argument is modified.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSchema`] when `schema` is `null`, not an
/// object, or cannot be compiled. A document that merely fails validation is
/// not an error: the returned report is non-empty instead.
pub fn validate(document: &Value, schema: &Value) -> Result<ViolationReport> {
    if !schema.is_object() {
        return Err(ConfigError::InvalidSchema {
            reason: "schema must be a JSON object".into(),
        });
    }

    let mut options = jsonschema::options();
    options.should_validate_formats(true);
    options.with_retriever(OfflineRetriever);
    let validator = options.build(schema).map_err(|e| ConfigError::InvalidSchema {
        reason: e.to_string(),
    })?;

    let violations = validator
        .iter_errors(document)
        .map(|e| {
            let message = e.to_string();
            let pointer = Pointer::parse(&e.instance_path.to_string()).unwrap_or_default();
            Violation {
                pointer,
                instance: e.instance.into_owned(),
                message,
            }
        })
        .collect::<Vec<_>>();

    if !violations.is_empty() {
        debug!("document has {} violation(s)", violations.len());
    }
    Ok(violations.into())
}

/// Validate and turn a non-empty report into [`ConfigError::ValidationFailed`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSchema`] or [`ConfigError::ValidationFailed`].
pub fn ensure_valid(document: &Value, schema: &Value) -> Result<()> {
    let violations = validate(document, schema)?;
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{defaults::synthesize, schema::SchemaNode};
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "port": {"type": "integer", "minimum": 1, "default": 8080},
                "mode": {"type": "string", "enum": ["fast", "safe"]},
                "tags": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                "admin": {"type": "string", "format": "email", "default": "root@example.com"}
            },
            "required": ["port"]
        })
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({"port": 80, "mode": "fast", "tags": ["a"], "admin": "a@b.org"});
        assert!(validate(&doc, &schema()).unwrap().is_empty());
    }

    #[test]
    fn test_violations_carry_pointer_and_value() {
        let doc = json!({"port": 0, "mode": "slow", "tags": ["ok", 5]});
        let report = validate(&doc, &schema()).unwrap();
        assert_eq!(report.len(), 3);

        let at = |p: &str| {
            report
                .iter()
                .find(|v| v.pointer.to_string() == p)
                .unwrap_or_else(|| panic!("no violation at {p}: {report}"))
        };
        assert_eq!(at("/port").instance, json!(0));
        assert_eq!(at("/mode").instance, json!("slow"));
        assert_eq!(at("/tags/1").instance, json!(5));
        assert!(report.first_under(&Pointer::parse("/tags").unwrap()).is_some());
    }

    #[test]
    fn test_root_violation_and_report_format() {
        let report = validate(&json!({}), &schema()).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.violations()[0].pointer.is_root());
        let text = report.to_string();
        assert!(text.starts_with("[1] Validation error at (root) (value: {}): "), "{text}");
    }

    #[test]
    fn test_format_checked() {
        let doc = json!({"port": 1, "admin": "not an email"});
        let report = validate(&doc, &schema()).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].pointer.to_string(), "/admin");
    }

    #[test]
    fn test_invalid_schema() {
        for bad in [Value::Null, json!(5), json!("object"), json!([])] {
            assert!(matches!(
                validate(&json!({}), &bad),
                Err(ConfigError::InvalidSchema { .. })
            ));
        }
        assert!(matches!(
            validate(&json!({}), &json!({"type": 12})),
            Err(ConfigError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_does_not_mutate() {
        let doc = json!({"port": -1});
        let schema = schema();
        let (doc_before, schema_before) = (doc.clone(), schema.clone());
        let _ = validate(&doc, &schema).unwrap();
        assert_eq!(doc, doc_before);
        assert_eq!(schema, schema_before);
    }

    #[test]
    fn test_defaults_conform() {
        let schemas = [
            schema(),
            json!({
                "type": "object",
                "properties": {
                    "servers": {
                        "type": "array",
                        "minItems": 2,
                        "items": {
                            "type": "object",
                            "properties": {
                                "host": {"type": "string"},
                                "weight": {"type": "number", "minimum": 0.5},
                                "level": {"type": "integer", "enum": [3, 4]},
                                "on": {"type": "boolean"}
                            },
                            "required": ["host", "weight", "level", "on"]
                        }
                    }
                }
            }),
        ];
        for raw in schemas {
            let doc = synthesize(&SchemaNode::parse(&raw));
            let report = validate(&doc, &raw).unwrap();
            assert!(report.is_empty(), "{doc} -> {report}");
        }
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid(&json!({"port": 3}), &schema()).is_ok());
        let err = ensure_valid(&json!({"port": "x"}), &schema()).unwrap_err();
        assert_eq!(err.violations().map(ViolationReport::len), Some(1));
    }
}
