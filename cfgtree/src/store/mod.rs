//! Configuration directory store and active pointer.
//!
//! One `<name>.json` file per document in a single directory, plus an
//! [`ActiveRecord`] naming the active document. Activation is gated on
//! validation; the record is swapped by remove-then-recreate, which leaves a
//! short window with no active document. That is acceptable for a
//! single-user local tool and nothing here locks.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};

use crate::{
    data::{defaults::synthesize, schema::Schema},
    error::{ConfigError, Result},
    validate::validate,
};

/// Active pointer record implementations.
pub mod record;

pub use record::{ActiveRecord, FileRecord, default_record};

#[cfg(unix)]
pub use record::SymlinkRecord;

/// Suffix of document files.
pub const CONFIG_EXTENSION: &str = "json";

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("name pattern is a valid regex"));

/// Check a document name against the allow-list (letters, digits, `-`, `_`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidName`] for anything else, including the
/// empty string.
pub fn validate_name(name: &str) -> Result<()> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Outcome of [`ConfigStore::revalidate_active`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveCheck {
    /// No document is active.
    Inactive,
    /// The active document still validates.
    Valid(String),
    /// The active document stopped validating and was deactivated.
    Deactivated {
        /// Name of the former active document.
        name: String,
        /// Violation report or parse error.
        reason: String,
    },
}

/// A directory of named JSON documents with one optional active document.
#[derive(Debug)]
pub struct ConfigStore {
    dir: PathBuf,
    record: Box<dyn ActiveRecord>,
}

impl ConfigStore {
    /// Open (creating if needed) a store with the platform's default record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;
        let record = default_record(&dir);
        Ok(Self { dir, record })
    }

    /// Store over an existing directory with a caller-chosen record.
    pub fn with_record(dir: impl Into<PathBuf>, record: Box<dyn ActiveRecord>) -> Self {
        Self {
            dir: dir.into(),
            record,
        }
    }

    /// The configuration directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path of document `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidName`] if `name` fails the allow-list.
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{CONFIG_EXTENSION}")))
    }

    /// Whether document `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).is_ok_and(|p| p.is_file())
    }

    /// Names of all stored documents, sorted.
    ///
    /// Files whose stem fails the name allow-list are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the directory cannot be read.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ConfigError::io(&self.dir, e))?;
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::io(&self.dir, e))?;
            let path = entry.path();
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_file || path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_name(stem).is_ok() {
                names.insert(stem.to_string());
            } else {
                debug!("skipping {}: not a valid config name", path.display());
            }
        }
        Ok(names)
    }

    /// Read document `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] if it does not exist,
    /// [`ConfigError::ParseFailure`] if it is not valid JSON.
    pub fn load(&self, name: &str) -> Result<Value> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(ConfigError::not_found(format!("config `{name}`")));
        }
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailure { path, source: e })
    }

    /// Write document `name`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure.
    pub fn save(&self, name: &str, document: &Value) -> Result<()> {
        let path = self.path_of(name)?;
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        document
            .serialize(&mut ser)
            .map_err(|e| ConfigError::io(&path, e.into()))?;
        buf.push(b'\n');
        fs::write(&path, buf).map_err(|e| ConfigError::io(&path, e))?;
        debug!("saved {}", path.display());
        Ok(())
    }

    /// Create document `name` from the schema's synthesized defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidName`], [`ConfigError::AlreadyExists`] or
    /// [`ConfigError::Io`].
    pub fn create(&self, name: &str, schema: &Schema) -> Result<Value> {
        if self.path_of(name)?.exists() {
            return Err(ConfigError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let document = synthesize(schema.root());
        self.save(name, &document)?;
        info!("created config `{name}`");
        Ok(document)
    }

    /// Delete document `name`, clearing the record first if it is active.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] if it does not exist, or [`ConfigError::Io`].
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(ConfigError::not_found(format!("config `{name}`")));
        }
        if self.active()?.as_deref() == Some(name) {
            self.deactivate()?;
        }
        fs::remove_file(&path).map_err(|e| ConfigError::io(&path, e))?;
        info!("deleted config `{name}`");
        Ok(())
    }

    fn record_path(&self) -> PathBuf {
        self.dir.join(record::ACTIVE_RECORD_NAME)
    }

    /// Name of the active document.
    ///
    /// A record naming a document that no longer exists reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] only if the record itself cannot be read.
    pub fn active(&self) -> Result<Option<String>> {
        let Some(name) = self
            .record
            .read()
            .map_err(|e| ConfigError::io(self.record_path(), e))?
        else {
            return Ok(None);
        };
        if self.contains(&name) {
            Ok(Some(name))
        } else {
            warn!("active record points at missing config `{name}`, ignoring it");
            Ok(None)
        }
    }

    /// Make `name` the active document.
    ///
    /// The document is loaded and validated against `schema` first; on any
    /// failure the record is left as it was.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ActivationRejected`] if it does not validate
    /// - [`ConfigError::NotFound`] / [`ConfigError::ParseFailure`] from loading
    /// - [`ConfigError::InvalidSchema`] if the schema cannot be used
    pub fn set_active(&self, name: &str, schema: &Schema) -> Result<()> {
        let document = self.load(name)?;
        let violations = validate(&document, schema.raw())?;
        if !violations.is_empty() {
            warn!(
                "refusing to activate `{name}`: {} violation(s)",
                violations.len()
            );
            return Err(ConfigError::ActivationRejected {
                name: name.to_string(),
                violations,
            });
        }

        let record_path = self.record_path();
        self.record
            .remove()
            .map_err(|e| ConfigError::io(&record_path, e))?;
        self.record
            .write(name)
            .map_err(|e| ConfigError::io(&record_path, e))?;
        info!("activated config `{name}`");
        Ok(())
    }

    /// Clear the active record. A no-op when nothing is active.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the record cannot be removed.
    pub fn deactivate(&self) -> Result<()> {
        if self.record.exists() {
            self.record
                .remove()
                .map_err(|e| ConfigError::io(self.record_path(), e))?;
            info!("cleared active config record");
        }
        Ok(())
    }

    /// Re-check the active document against the current schema.
    ///
    /// Validity is only checked when a document becomes active; this is the
    /// lazy re-check done at startup. A document that no longer validates or
    /// parses is deactivated, and a dangling record is cleared.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::InvalidSchema`].
    pub fn revalidate_active(&self, schema: &Schema) -> Result<ActiveCheck> {
        let Some(name) = self.active()? else {
            if self.record.exists() {
                self.deactivate()?;
            }
            return Ok(ActiveCheck::Inactive);
        };

        let reason = match self.load(&name) {
            Ok(document) => {
                let violations = validate(&document, schema.raw())?;
                if violations.is_empty() {
                    return Ok(ActiveCheck::Valid(name));
                }
                violations.to_string()
            }
            Err(e @ ConfigError::ParseFailure { .. }) => e.to_string(),
            Err(e) => return Err(e),
        };

        self.deactivate()?;
        warn!("active config `{name}` no longer validates, deactivated it");
        Ok(ActiveCheck::Deactivated { name, reason })
    }
}
