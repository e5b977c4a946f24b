//! Error taxonomy for the configuration engine.
//!
//! Resolution and default synthesis never fail; they degrade to an opaque
//! leaf or `null`. Everything else reports one of these variants, and no
//! operation applies a partial mutation before returning an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::validate::ViolationReport;

/// Errors reported by validation, array mutation and the config store.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The schema handed to the validator is missing, `null`, not an object,
    /// or cannot be compiled.
    #[error("invalid schema: {reason}")]
    InvalidSchema {
        /// Why the schema was refused.
        reason: String,
    },

    /// The document does not conform to the schema.
    #[error("config validation failed:\n{violations}")]
    ValidationFailed {
        /// Every violation found.
        violations: ViolationReport,
    },

    /// `set_active` was called on a document that does not validate.
    #[error("config `{name}` was not activated, it does not pass schema validation:\n{violations}")]
    ActivationRejected {
        /// Name of the rejected document.
        name: String,
        /// Every violation found.
        violations: ViolationReport,
    },

    /// Deleting an array element would go below the schema's `minItems`.
    #[error("cannot remove {pointer}: the array has {len} item(s) and requires at least {min_items}")]
    CardinalityViolation {
        /// Pointer of the element that was to be removed.
        pointer: String,
        /// Current array length.
        len: usize,
        /// The array's `minItems`.
        min_items: usize,
    },

    /// An explicitly requested document or pointer does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Description of what was looked up.
        what: String,
    },

    /// An on-disk document is not well-formed JSON.
    #[error("failed to parse {}: {source}", .path.display())]
    ParseFailure {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// Pointer text that is neither empty nor starts with `/`.
    #[error("invalid JSON pointer {pointer:?}: must be empty or start with `/`")]
    InvalidPointer {
        /// The offending text.
        pointer: String,
    },

    /// Document name outside the `[A-Za-z0-9_-]` allow-list.
    #[error("invalid config name {name:?}: only letters, digits, `-` and `_` are allowed")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// A document with this name already exists.
    #[error("config `{name}` already exists")]
    AlreadyExists {
        /// The duplicate name.
        name: String,
    },

    /// An edit or mutation targeted a value of the wrong type.
    #[error("type mismatch at {pointer}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Pointer of the target node.
        pointer: String,
        /// What the schema or operation expects.
        expected: String,
        /// What was found or entered.
        actual: String,
    },

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::NotFound`] for `what`.
    pub fn not_found(what: impl Into<String>) -> Self {
        ConfigError::NotFound { what: what.into() }
    }

    /// Returns the violations carried by validation-related errors.
    pub fn violations(&self) -> Option<&ViolationReport> {
        match self {
            ConfigError::ValidationFailed { violations }
            | ConfigError::ActivationRejected { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
