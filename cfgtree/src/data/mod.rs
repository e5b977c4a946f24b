//! Configuration tree data structures and pure engine operations.
//!
//! Every function in this module works on a document ([`serde_json::Value`])
//! and the typed schema model; nothing here touches the filesystem.
//!
//! ## Architecture
//!
//! - [`pointer`] - JSON Pointer codec and document lookup
//! - [`schema`] - Typed schema model parsed from the raw JSON Schema
//! - [`resolver`] - Pointer to subschema resolution and its queries
//! - [`types`] - Schema types and editor affordances
//! - [`defaults`] - Default document synthesis and repair
//! - [`tree`] - Flattening into an ordered node list
//! - [`item`] - Text input parsing and in-place value writes
//! - [`array`] - Array append/delete with `minItems` enforcement

/// Array append and delete honouring `minItems`.
pub mod array;

/// Default value synthesis.
pub mod defaults;

/// Edit input parsing and in-place writes.
pub mod item;

/// JSON Pointer codec.
pub mod pointer;

/// Subschema resolution.
pub mod resolver;

/// Typed schema model.
pub mod schema;

/// Document flattening.
pub mod tree;

/// Schema type and affordance definitions.
pub mod types;
