//! Active pointer record implementations.
//!
//! The record names at most one document of a configuration directory.
//! Only the [`ActiveRecord`] contract matters to the store; the mechanism
//! is a symbolic link on unix and a small sentinel file elsewhere.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

/// File name of the record inside the configuration directory.
pub const ACTIVE_RECORD_NAME: &str = "active";

/// Persistent "which document is active" indirection.
pub trait ActiveRecord: fmt::Debug {
    /// Point the record at `name`, replacing any previous target.
    fn write(&self, name: &str) -> io::Result<()>;

    /// Name the record points at, if it exists.
    fn read(&self) -> io::Result<Option<String>>;

    /// Whether a record exists, dangling or not.
    fn exists(&self) -> bool;

    /// Remove the record. Removing a missing record is not an error.
    fn remove(&self) -> io::Result<()>;
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Symbolic link `<dir>/active -> <name>.json`.
///
/// The target is relative so the link survives moving the directory.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct SymlinkRecord {
    dir: PathBuf,
    link: PathBuf,
}

#[cfg(unix)]
impl SymlinkRecord {
    /// Record living in configuration directory `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let link = dir.join(ACTIVE_RECORD_NAME);
        Self { dir, link }
    }
}

#[cfg(unix)]
impl ActiveRecord for SymlinkRecord {
    fn write(&self, name: &str) -> io::Result<()> {
        remove_if_present(&self.link)?;
        std::os::unix::fs::symlink(format!("{name}.json"), &self.link)
    }

    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_link(&self.link) {
            Ok(target) => {
                // Only siblings of the link name a document of this directory.
                let local = target
                    .parent()
                    .is_some_and(|p| p.as_os_str().is_empty() || p == self.dir);
                if !local {
                    debug!("active link points outside {}", self.dir.display());
                    return Ok(None);
                }
                Ok(target
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Something that is not a link sits at the record path.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn exists(&self) -> bool {
        fs::symlink_metadata(&self.link).is_ok()
    }

    fn remove(&self) -> io::Result<()> {
        remove_if_present(&self.link)
    }
}

/// Sentinel file `<dir>/active` holding the active document's name.
#[derive(Debug, Clone)]
pub struct FileRecord {
    path: PathBuf,
}

impl FileRecord {
    /// Record living in configuration directory `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(ACTIVE_RECORD_NAME),
        }
    }
}

impl ActiveRecord for FileRecord {
    fn write(&self, name: &str) -> io::Result<()> {
        remove_if_present(&self.path)?;
        fs::write(&self.path, format!("{name}\n"))
    }

    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let name = content.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn remove(&self) -> io::Result<()> {
        remove_if_present(&self.path)
    }
}

/// The record used by default on this platform.
pub fn default_record(dir: &Path) -> Box<dyn ActiveRecord> {
    #[cfg(unix)]
    {
        Box::new(SymlinkRecord::new(dir))
    }
    #[cfg(not(unix))]
    {
        Box::new(FileRecord::new(dir))
    }
}
