//! Per-application settings file.
//!
//! `settings.toml` lives next to the configuration directory. Every key is
//! optional; a missing file means all defaults.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use cfgtree::data::tree::{FlattenOptions, PREVIEW_WIDTH};
use serde::{Deserialize, Serialize};

/// File name of the settings file inside the application root.
pub const SETTINGS_FILE: &str = "settings.toml";

/// Tool settings for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Override of the configuration directory.
    pub config_dir: Option<PathBuf>,
    /// Override of the schema path.
    pub schema: Option<PathBuf>,
    /// Display budget for value previews, in characters.
    pub preview_width: usize,
    /// Insert defaults for missing properties when a config is opened for
    /// editing.
    pub fill_missing_on_open: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: None,
            schema: None,
            preview_width: PREVIEW_WIDTH,
            fill_missing_on_open: false,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        Ok(settings)
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            preview_width: self.preview_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.flatten_options().preview_width, 32);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "preview_width = 12\nfill_missing_on_open = true\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.preview_width, 12);
        assert!(settings.fill_missing_on_open);
        assert_eq!(settings.config_dir, None);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "preview_widht = 12\n").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse settings"));
    }
}
