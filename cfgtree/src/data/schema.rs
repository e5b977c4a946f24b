//! Typed schema model.
//!
//! The raw JSON Schema is parsed once into a small tree of [`SchemaNode`]s so
//! every later lookup is a typed dispatch instead of repeated untyped key
//! lookups. Only the keywords the engine interprets are kept: `type`,
//! `properties`, `items`, `minItems`, `enum`, `default`, `minimum`,
//! `title` and `description`. Validation always runs against the raw schema,
//! so nothing is lost by this projection.
//!
//! Parsing never fails. Anything the model cannot express (missing `type`,
//! unsupported keywords, dangling or recursive `$ref`s) becomes
//! [`SchemaKind::Unknown`], an opaque leaf edited as raw JSON.

use std::{fs, path::Path};

use schemars::JsonSchema;
use serde_json::{Map, Value};

use crate::{
    data::{
        pointer::Pointer,
        resolver,
        types::{Affordance, SchemaType},
    },
    error::{ConfigError, Result},
    validate::{self, ViolationReport},
};

/// Description returned for nodes whose schema carries none.
pub const NO_DESCRIPTION: &str = "No description";

/// Metadata shared by every schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMeta {
    /// `title` keyword.
    pub title: Option<String>,
    /// `description` keyword.
    pub description: Option<String>,
}

/// Scalar leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// `"type": "string"`.
    String,
    /// `"type": "integer"`.
    Integer,
    /// `"type": "number"`.
    Number,
    /// `"type": "boolean"`.
    Boolean,
}

/// A scalar leaf schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// Scalar type.
    pub kind: LeafKind,
    /// Allowed values, when the schema carries an `enum` array.
    pub enum_values: Option<Vec<Value>>,
    /// `default` keyword, verbatim.
    pub default: Option<Value>,
    /// `minimum` keyword, verbatim.
    pub minimum: Option<Value>,
}

/// Shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// Object with properties in declaration order.
    Object {
        /// Property name and subschema pairs.
        properties: Vec<(String, SchemaNode)>,
    },
    /// Homogeneous array; every index shares `items`.
    Array {
        /// Element schema.
        items: Box<SchemaNode>,
        /// `minItems`, 0 when absent.
        min_items: usize,
    },
    /// Scalar value.
    Leaf(Leaf),
    /// Missing or unsupported type.
    Unknown,
}

/// One node of the typed schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Title and description.
    pub meta: NodeMeta,
    /// Node shape.
    pub kind: SchemaKind,
}

impl SchemaNode {
    /// The opaque leaf every unresolvable lookup degrades to.
    pub const UNKNOWN: SchemaNode = SchemaNode {
        meta: NodeMeta {
            title: None,
            description: None,
        },
        kind: SchemaKind::Unknown,
    };

    /// Parse a raw JSON Schema into the typed model.
    pub fn parse(root: &Value) -> SchemaNode {
        Parser {
            root,
            expanding: Vec::new(),
        }
        .node(root)
    }

    /// Declared type of this node.
    pub fn schema_type(&self) -> SchemaType {
        match &self.kind {
            SchemaKind::Object { .. } => SchemaType::Object,
            SchemaKind::Array { .. } => SchemaType::Array,
            SchemaKind::Leaf(leaf) => match leaf.kind {
                LeafKind::String => SchemaType::String,
                LeafKind::Integer => SchemaType::Integer,
                LeafKind::Number => SchemaType::Number,
                LeafKind::Boolean => SchemaType::Boolean,
            },
            SchemaKind::Unknown => SchemaType::Unknown,
        }
    }

    /// Subschema of a named property of an object node.
    pub fn property(&self, key: &str) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Object { properties } => {
                properties.iter().find(|(k, _)| k == key).map(|(_, n)| n)
            }
            _ => None,
        }
    }

    /// Element schema of an array node.
    pub fn items(&self) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// `enum` values of a leaf node.
    pub fn enum_values(&self) -> Option<&[Value]> {
        match &self.kind {
            SchemaKind::Leaf(leaf) => leaf.enum_values.as_deref(),
            _ => None,
        }
    }

    /// `description`, or [`NO_DESCRIPTION`].
    pub fn description(&self) -> &str {
        self.meta.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }

    /// `minItems` of an array node; 0 for everything else.
    pub fn min_items(&self) -> usize {
        match &self.kind {
            SchemaKind::Array { min_items, .. } => *min_items,
            _ => 0,
        }
    }

    /// Input widget a renderer should offer for this node.
    pub fn affordance(&self) -> Affordance<'_> {
        if let Some(values) = self.enum_values() {
            return Affordance::Enum(values);
        }
        match self.schema_type() {
            SchemaType::Boolean => Affordance::Boolean,
            SchemaType::String => Affordance::String,
            SchemaType::Integer => Affordance::Integer,
            SchemaType::Number => Affordance::Number,
            SchemaType::Object | SchemaType::Array | SchemaType::Unknown => Affordance::Json,
        }
    }
}

struct Parser<'a> {
    root: &'a Value,
    /// `$ref`s currently being expanded, to cut recursive schemas.
    expanding: Vec<String>,
}

impl<'a> Parser<'a> {
    fn node(&mut self, schema: &'a Value) -> SchemaNode {
        let Some(obj) = schema.as_object() else {
            return SchemaNode::UNKNOWN;
        };
        let meta = meta_of(obj);

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return self.reference(reference, meta);
        }

        let kind = match declared_type(obj) {
            Some("object") => SchemaKind::Object {
                properties: obj
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| {
                        props
                            .iter()
                            .map(|(key, sub)| (key.clone(), self.node(sub)))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            Some("array") => SchemaKind::Array {
                items: Box::new(
                    obj.get("items")
                        .map(|items| self.node(items))
                        .unwrap_or(SchemaNode::UNKNOWN),
                ),
                min_items: obj
                    .get("minItems")
                    .and_then(Value::as_u64)
                    .map(|n| n as usize)
                    .unwrap_or(0),
            },
            Some("string") => leaf(LeafKind::String, obj),
            Some("integer") => leaf(LeafKind::Integer, obj),
            Some("number") => leaf(LeafKind::Number, obj),
            Some("boolean") => leaf(LeafKind::Boolean, obj),
            _ => SchemaKind::Unknown,
        };

        SchemaNode { meta, kind }
    }

    fn reference(&mut self, reference: &str, meta: NodeMeta) -> SchemaNode {
        let opaque = |meta: NodeMeta| SchemaNode {
            meta,
            kind: SchemaKind::Unknown,
        };

        let Some(fragment) = reference.strip_prefix('#') else {
            warn!("schema $ref {reference:?} is not local, treating it as opaque");
            return opaque(meta);
        };
        if self.expanding.iter().any(|r| r == reference) {
            debug!("recursive schema $ref {reference:?}, treating it as opaque");
            return opaque(meta);
        }
        let Some(target) = self.root.pointer(fragment) else {
            warn!("schema $ref {reference:?} does not resolve, treating it as opaque");
            return opaque(meta);
        };

        self.expanding.push(reference.to_string());
        let mut node = self.node(target);
        self.expanding.pop();

        // Annotations next to a `$ref` win over the referenced schema's own.
        if meta.title.is_some() {
            node.meta.title = meta.title;
        }
        if meta.description.is_some() {
            node.meta.description = meta.description;
        }
        node
    }
}

fn meta_of(obj: &Map<String, Value>) -> NodeMeta {
    let text = |key| obj.get(key).and_then(Value::as_str).map(str::to_string);
    NodeMeta {
        title: text("title"),
        description: text("description"),
    }
}

/// `type` as a string, or the first non-`"null"` entry of a type array.
fn declared_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

fn leaf(kind: LeafKind, obj: &Map<String, Value>) -> SchemaKind {
    SchemaKind::Leaf(Leaf {
        kind,
        enum_values: obj.get("enum").and_then(Value::as_array).cloned(),
        default: obj.get("default").cloned(),
        minimum: obj.get("minimum").cloned(),
    })
}

/// A loaded schema: the raw document plus its typed projection.
///
/// Loaded once by the caller and passed by reference into every engine call.
#[derive(Debug, Clone)]
pub struct Schema {
    raw: Value,
    root: SchemaNode,
}

impl Schema {
    /// Wrap a raw schema value.
    pub fn from_value(raw: Value) -> Self {
        let root = SchemaNode::parse(&raw);
        Self { raw, root }
    }

    /// Read and parse a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::ParseFailure`] if it is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let raw: Value = serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailure {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("loaded schema {}", path.display());
        Ok(Self::from_value(raw))
    }

    /// Generate the schema of a Rust type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSchema`] if the generated schema cannot
    /// be converted to JSON.
    pub fn for_type<C: JsonSchema>() -> Result<Self> {
        let schema = schemars::schema_for!(C);
        let raw = serde_json::to_value(&schema).map_err(|e| ConfigError::InvalidSchema {
            reason: e.to_string(),
        })?;
        Ok(Self::from_value(raw))
    }

    /// The raw schema document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Root of the typed model.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Root `title`, if any.
    pub fn title(&self) -> Option<&str> {
        self.root.meta.title.as_deref()
    }

    /// Subschema governing `pointer`; see [`resolver::resolve`].
    pub fn resolve(&self, pointer: &Pointer) -> &SchemaNode {
        resolver::resolve(&self.root, pointer)
    }

    /// Validate a document against the raw schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSchema`] when the raw schema is not an
    /// object or cannot be compiled.
    pub fn validate(&self, document: &Value) -> Result<ViolationReport> {
        validate::validate(document, &self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_keeps_declaration_order() {
        let node = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "integer", "minimum": 1},
                "mid": {"type": "boolean", "default": true}
            }
        }));
        let SchemaKind::Object { properties } = &node.kind else {
            panic!("expected object, got {node:?}");
        };
        let keys: Vec<&str> = properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(
            node.property("alpha").unwrap().schema_type(),
            SchemaType::Integer
        );
    }

    #[test]
    fn test_parse_array() {
        let node = SchemaNode::parse(&json!({
            "type": "array",
            "items": {"type": "string", "enum": ["a", "b"]},
            "minItems": 2
        }));
        assert_eq!(node.schema_type(), SchemaType::Array);
        assert_eq!(node.min_items(), 2);
        let items = node.items().unwrap();
        assert_eq!(items.enum_values(), Some(&[json!("a"), json!("b")][..]));
    }

    #[test]
    fn test_array_without_items() {
        let node = SchemaNode::parse(&json!({"type": "array"}));
        assert_eq!(node.items(), Some(&SchemaNode::UNKNOWN));
        assert_eq!(node.min_items(), 0);
    }

    #[test]
    fn test_missing_or_bad_type_is_unknown() {
        assert_eq!(SchemaNode::parse(&json!({})).schema_type(), SchemaType::Unknown);
        assert_eq!(
            SchemaNode::parse(&json!({"type": "null"})).schema_type(),
            SchemaType::Unknown
        );
        assert_eq!(SchemaNode::parse(&json!(true)).schema_type(), SchemaType::Unknown);
        assert_eq!(
            SchemaNode::parse(&json!({"enum": [1, 2]})).enum_values(),
            None
        );
    }

    #[test]
    fn test_nullable_type_array() {
        let node = SchemaNode::parse(&json!({"type": ["null", "integer"]}));
        assert_eq!(node.schema_type(), SchemaType::Integer);
    }

    #[test]
    fn test_description_sentinel() {
        let node = SchemaNode::parse(&json!({"type": "string", "description": "Host name"}));
        assert_eq!(node.description(), "Host name");
        assert_eq!(SchemaNode::UNKNOWN.description(), NO_DESCRIPTION);
    }

    #[test]
    fn test_local_ref() {
        let node = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "server": {"$ref": "#/$defs/Server", "description": "Main server"}
            },
            "$defs": {
                "Server": {
                    "type": "object",
                    "description": "A server",
                    "properties": {"port": {"type": "integer"}}
                }
            }
        }));
        let server = node.property("server").unwrap();
        assert_eq!(server.schema_type(), SchemaType::Object);
        assert_eq!(server.description(), "Main server");
        assert_eq!(
            server.property("port").unwrap().schema_type(),
            SchemaType::Integer
        );
    }

    #[test]
    fn test_recursive_and_dangling_ref() {
        let node = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "tree": {"$ref": "#/$defs/Tree"},
                "lost": {"$ref": "#/$defs/Missing"},
                "remote": {"$ref": "https://example.com/schema.json"}
            },
            "$defs": {
                "Tree": {
                    "type": "object",
                    "properties": {"child": {"$ref": "#/$defs/Tree"}}
                }
            }
        }));
        let tree = node.property("tree").unwrap();
        assert_eq!(tree.schema_type(), SchemaType::Object);
        assert_eq!(
            tree.property("child").unwrap().schema_type(),
            SchemaType::Unknown
        );
        assert_eq!(node.property("lost").unwrap().schema_type(), SchemaType::Unknown);
        assert_eq!(node.property("remote").unwrap().schema_type(), SchemaType::Unknown);
    }

    #[test]
    fn test_affordance() {
        let node = SchemaNode::parse(&json!({"type": "string", "enum": ["x"]}));
        assert!(matches!(node.affordance(), Affordance::Enum(v) if v.len() == 1));
        let node = SchemaNode::parse(&json!({"type": "boolean"}));
        assert_eq!(node.affordance(), Affordance::Boolean);
        assert_eq!(SchemaNode::UNKNOWN.affordance(), Affordance::Json);
        let node = SchemaNode::parse(&json!({"type": "object"}));
        assert_eq!(node.affordance(), Affordance::Json);
    }

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct ServerConfig {
        /// Listen port.
        port: u16,
        /// Tags attached to the server.
        tags: Vec<String>,
        verbose: bool,
    }

    #[test]
    fn test_schema_for_type() {
        let schema = Schema::for_type::<ServerConfig>().unwrap();
        assert_eq!(schema.title(), Some("ServerConfig"));
        let root = schema.root();
        assert_eq!(root.schema_type(), SchemaType::Object);
        assert_eq!(root.property("port").unwrap().schema_type(), SchemaType::Integer);
        assert_eq!(root.property("port").unwrap().description(), "Listen port.");
        assert_eq!(root.property("tags").unwrap().schema_type(), SchemaType::Array);
        assert_eq!(
            root.property("verbose").unwrap().schema_type(),
            SchemaType::Boolean
        );
    }
}
