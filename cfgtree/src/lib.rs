//! # cfgtree
//!
//! A schema-driven configuration tree engine for directories of JSON
//! configuration documents.
//!
//! `cfgtree` walks a JSON Schema in step with a configuration document so a
//! front end (terminal menu, CLI, anything that can draw a list) can browse,
//! edit and validate the document node by node, and keeps a persistent
//! pointer to the single "active" document of a configuration directory.
//!
//! ## Features
//!
//! - JSON Pointer (RFC 6901) encoding, decoding and lookup
//! - Typed schema model parsed once from the raw schema, with local `$ref`s
//! - Subschema resolution for any pointer, degrading to an opaque leaf
//! - Schema-conformant default documents (arrays padded to `minItems`)
//! - Deterministic flattening into an ordered list of addressable nodes
//! - Validation with pointer-tagged violation reports
//! - Array append/delete honouring `minItems`
//! - A configuration store with a validation-gated active pointer
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgtree::{Schema, data::{defaults::synthesize, tree::flatten}};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "type": "object",
//!     "properties": {
//!         "port": {"type": "integer", "minimum": 1, "default": 8080},
//!         "tags": {"type": "array", "items": {"type": "string"}, "minItems": 1}
//!     }
//! }));
//!
//! let doc = synthesize(schema.root());
//! assert_eq!(doc, json!({"port": 8080, "tags": [""]}));
//!
//! let pointers: Vec<String> = flatten(&doc, schema.root())
//!     .iter()
//!     .map(|n| n.pointer.to_string())
//!     .collect();
//! assert_eq!(pointers, ["/port", "/tags", "/tags/0"]);
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Pointers, schema model, resolution, defaults, flattening, edits
//! - [`validate`] - Validation with pointer-tagged reports
//! - [`store`] - Configuration directory and active pointer record
//! - [`session`] - Edit session state and render callback contract
//! - [`error`] - Error taxonomy

#[macro_use]
extern crate log;

/// Configuration tree data structures and the pure engine operations.
pub mod data;

/// Error types shared by every fallible operation.
pub mod error;

/// Edit session state for interactive front ends.
pub mod session;

/// Configuration directory store and active pointer record.
pub mod store;

/// Document validation against the raw JSON Schema.
pub mod validate;

pub use data::{pointer::Pointer, schema::Schema, tree::TreeNode};
pub use error::{ConfigError, Result};
pub use serde_json::Value;
