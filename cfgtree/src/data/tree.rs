//! Flattening a document into an ordered list of addressable nodes.
//!
//! The traversal is depth-first pre-order and mirrors the resolver's descent
//! rules: object properties in schema declaration order, array elements in
//! index order. Only nodes present in the document are emitted, so every
//! node pointer resolves in the document and in the schema.
//!
//! There is no incremental update. After any mutation the caller flattens
//! again; array deletions shift sibling indices and a rebuild is the only way
//! to keep pointers honest.

use serde::Serialize;
use serde_json::Value;

use crate::data::{
    pointer::Pointer,
    schema::{SchemaKind, SchemaNode},
    types::SchemaType,
};

/// Default display budget for value previews, in characters.
pub const PREVIEW_WIDTH: usize = 32;

const ELLIPSIS: &str = "...";

/// One addressable node of a flattened document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    /// Location in the document.
    pub pointer: Pointer,
    /// Property name, or `[i]` for array elements.
    pub label: String,
    /// Nesting level; top-level properties are 0.
    pub depth: usize,
    /// Declared type of the governing subschema.
    pub schema_type: SchemaType,
    /// Truncated value preview, present for scalar leaves only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl TreeNode {
    /// Indented single-line rendering: `label : preview`.
    pub fn display(&self) -> String {
        let indent = "  ".repeat(self.depth);
        match &self.preview {
            Some(preview) => format!("{indent}{} : {preview}", self.label),
            None => format!("{indent}{}", self.label),
        }
    }
}

/// Knobs for [`flatten_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Preview budget in characters, ellipsis included.
    pub preview_width: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            preview_width: PREVIEW_WIDTH,
        }
    }
}

/// Flatten with the default options.
pub fn flatten(document: &Value, schema: &SchemaNode) -> Vec<TreeNode> {
    flatten_with(document, schema, &FlattenOptions::default())
}

/// Flatten `document` under `schema` into pre-order nodes.
pub fn flatten_with(document: &Value, schema: &SchemaNode, opts: &FlattenOptions) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    walk(document, schema, &Pointer::root(), 0, opts, &mut nodes);
    nodes
}

fn walk(
    value: &Value,
    schema: &SchemaNode,
    pointer: &Pointer,
    depth: usize,
    opts: &FlattenOptions,
    out: &mut Vec<TreeNode>,
) {
    match &schema.kind {
        SchemaKind::Object { properties } => {
            let Some(map) = value.as_object() else {
                return;
            };
            for (key, sub) in properties {
                let Some(child) = map.get(key) else {
                    continue;
                };
                let child_ptr = pointer.child(key.as_str());
                out.push(node(child, sub, child_ptr.clone(), key.clone(), depth, opts));
                walk(child, sub, &child_ptr, depth + 1, opts, out);
            }
        }
        SchemaKind::Array { items, .. } => {
            let Some(arr) = value.as_array() else {
                return;
            };
            for (idx, child) in arr.iter().enumerate() {
                let child_ptr = pointer.index(idx);
                out.push(node(child, items, child_ptr.clone(), format!("[{idx}]"), depth, opts));
                walk(child, items, &child_ptr, depth + 1, opts, out);
            }
        }
        SchemaKind::Leaf(_) | SchemaKind::Unknown => {}
    }
}

fn node(
    value: &Value,
    schema: &SchemaNode,
    pointer: Pointer,
    label: String,
    depth: usize,
    opts: &FlattenOptions,
) -> TreeNode {
    let schema_type = schema.schema_type();
    TreeNode {
        pointer,
        label,
        depth,
        schema_type,
        preview: schema_type
            .is_scalar()
            .then(|| preview(value, opts.preview_width)),
    }
}

/// Type-formatted, truncated rendering of a value.
///
/// Strings are quoted, booleans are `true`/`false`, everything else is
/// compact JSON. Text longer than `width` characters is cut and ends in `...`.
pub fn preview(value: &Value, width: usize) -> String {
    let text = match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Display of a JSON string is the quoted, escaped form.
        other => other.to_string(),
    };
    truncate(&text, width)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width < ELLIPSIS.len() {
        return ELLIPSIS[..width].to_string();
    }
    let keep = width - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{defaults::synthesize, resolver::resolve};
    use serde_json::json;

    fn pointers(nodes: &[TreeNode]) -> Vec<String> {
        nodes.iter().map(|n| n.pointer.to_string()).collect()
    }

    fn schema() -> SchemaNode {
        SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "servers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "host": {"type": "string"},
                            "port": {"type": "integer"},
                            "tls": {"type": "boolean"}
                        }
                    }
                },
                "raw": {}
            }
        }))
    }

    #[test]
    fn test_example_order() {
        let schema = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "port": {"type": "integer", "minimum": 1, "default": 8080},
                "tags": {"type": "array", "items": {"type": "string"}, "minItems": 1}
            }
        }));
        let doc = synthesize(&schema);
        let nodes = flatten(&doc, &schema);
        assert_eq!(pointers(&nodes), ["/port", "/tags", "/tags/0"]);
        assert_eq!(nodes[0].label, "port");
        assert_eq!(nodes[0].preview.as_deref(), Some("8080"));
        assert_eq!(nodes[1].preview, None);
        assert_eq!(nodes[2].label, "[0]");
        assert_eq!(nodes[2].depth, 1);
        assert_eq!(nodes[2].preview.as_deref(), Some("\"\""));
    }

    #[test]
    fn test_schema_order_not_document_order() {
        let doc = json!({
            "raw": {"x": 1},
            "servers": [
                {"tls": true, "host": "a", "port": 1},
                {"host": "b"}
            ],
            "name": "demo"
        });
        let nodes = flatten(&doc, &schema());
        assert_eq!(
            pointers(&nodes),
            [
                "/name",
                "/servers",
                "/servers/0",
                "/servers/0/host",
                "/servers/0/port",
                "/servers/0/tls",
                "/servers/1",
                "/servers/1/host",
                "/raw",
            ]
        );
        assert_eq!(nodes[5].preview.as_deref(), Some("true"));
        assert_eq!(nodes[8].schema_type, SchemaType::Unknown);
        assert_eq!(nodes[8].preview, None);
    }

    #[test]
    fn test_deterministic() {
        let doc = json!({"name": "n", "servers": [{"host": "h"}, {"port": 2}]});
        let schema = schema();
        assert_eq!(flatten(&doc, &schema), flatten(&doc, &schema));
    }

    #[test]
    fn test_pointer_roundtrip_types() {
        let doc = json!({"name": "n", "servers": [{"host": "h", "port": 3, "tls": false}]});
        let schema = schema();
        for node in flatten(&doc, &schema) {
            let value = node.pointer.get(&doc).expect("node pointer resolves in document");
            let sub = resolve(&schema, &node.pointer);
            assert!(
                sub.schema_type().matches(value),
                "{} is {} but document holds {value}",
                node.pointer,
                sub.schema_type()
            );
            assert_eq!(sub.schema_type(), node.schema_type);
        }
    }

    #[test]
    fn test_shape_mismatch_emits_no_children() {
        let doc = json!({"servers": "oops", "name": 5});
        let nodes = flatten(&doc, &schema());
        assert_eq!(pointers(&nodes), ["/name", "/servers"]);
        assert_eq!(nodes[0].preview.as_deref(), Some("5"));
    }

    #[test]
    fn test_preview_truncation() {
        let long = "x".repeat(100);
        let text = preview(&json!(long), 10);
        assert_eq!(text.chars().count(), 10);
        assert!(text.starts_with("\"xxxxxx"));
        assert!(text.ends_with("..."));

        assert_eq!(preview(&json!("short"), 10), "\"short\"");
        assert_eq!(preview(&json!(false), 10), "false");
        // 多字节字符按字符截断，不会切断 UTF-8
        assert_eq!(preview(&json!("配置管理器配置管理器"), 8), "\"配置管理...");
    }

    #[test]
    fn test_preview_tiny_width() {
        for width in 0..=3 {
            let text = preview(&json!(12345), width);
            assert_eq!(text.chars().count(), width, "width {width}");
            assert!(text.chars().all(|c| c == '.'));
        }
        assert_eq!(preview(&json!(true), 4), "true");
    }

    #[test]
    fn test_display() {
        let node = TreeNode {
            pointer: Pointer::parse("/a/b").unwrap(),
            label: "b".into(),
            depth: 1,
            schema_type: SchemaType::Integer,
            preview: Some("3".into()),
        };
        assert_eq!(node.display(), "  b : 3");
    }
}
