//! Application context and path detection.
//!
//! This module provides the [`AppContext`] type which holds everything a
//! command needs for one application: resolved paths, settings, the loaded
//! schema and the opened configuration store.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow, bail};
use cfgtree::{
    Schema,
    session::EditSession,
    store::{ActiveCheck, ConfigStore, validate_name},
    validate::validate,
};
use colored::Colorize;
use serde_json::json;

use crate::settings::{SETTINGS_FILE, Settings};

/// Directory name of the configuration directory inside the app root.
pub const CONFIGS_DIR: &str = "configs";

/// File name of the schema, a sibling of the configuration directory.
pub const SCHEMA_FILE: &str = "schema.json";

/// Overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Configuration directory override.
    pub config_dir: Option<PathBuf>,
    /// Schema to install when none is present.
    pub schema: Option<PathBuf>,
}

/// Path configuration for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// Application root, `<platform config dir>/<app>`.
    pub root: PathBuf,
    /// Directory holding the `<name>.json` documents.
    pub config_dir: PathBuf,
    /// Schema file.
    pub schema: PathBuf,
    /// Settings file.
    pub settings: PathBuf,
}

impl PathConfig {
    /// Default layout under `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join(CONFIGS_DIR),
            schema: root.join(SCHEMA_FILE),
            settings: root.join(SETTINGS_FILE),
            root,
        }
    }

    /// Default layout for `app` under the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `app` is not a valid name or the platform has no
    /// config directory.
    pub fn detect(app: &str) -> anyhow::Result<Self> {
        validate_name(app)?;
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow!("cannot determine the platform config directory"))?;
        Ok(Self::from_root(base.join(app)))
    }

    /// Apply settings and command line overrides, command line last.
    ///
    /// The schema follows a moved configuration directory unless it is
    /// overridden itself.
    pub fn apply(&mut self, settings: &Settings, config_dir: Option<&Path>) {
        let config_dir = config_dir
            .map(Path::to_path_buf)
            .or_else(|| settings.config_dir.clone());
        if let Some(dir) = config_dir {
            if let Some(parent) = dir.parent() {
                self.schema = parent.join(SCHEMA_FILE);
            }
            self.config_dir = dir;
        }
        if let Some(schema) = &settings.schema {
            self.schema = schema.clone();
        }
    }

    /// Detect paths for `app`, load its settings and apply `opts`.
    ///
    /// # Errors
    ///
    /// See [`PathConfig::detect`] and [`Settings::load`].
    pub fn resolve(app: &str, opts: &StartupOptions) -> anyhow::Result<(Self, Settings)> {
        let mut paths = Self::detect(app)?;
        let settings = Settings::load(&paths.settings)?;
        paths.apply(&settings, opts.config_dir.as_deref());
        debug!("resolved paths: {paths:?}");
        Ok((paths, settings))
    }
}

/// Copy the schema at `src` to `dest` after checking it is usable.
///
/// # Errors
///
/// Returns an error if `src` is not valid JSON, cannot be compiled as a
/// schema, or `dest` exists and `force` is not set.
pub fn install_schema(src: &Path, dest: &Path, force: bool) -> anyhow::Result<()> {
    if dest.exists() && !force {
        bail!(
            "schema {} already exists, use --force to replace it",
            dest.display()
        );
    }
    let schema = Schema::load(src)?;
    validate(&json!({}), schema.raw())
        .with_context(|| format!("{} is not a usable schema", src.display()))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::copy(src, dest)
        .with_context(|| format!("failed to install schema to {}", dest.display()))?;
    info!("installed schema {} -> {}", src.display(), dest.display());
    Ok(())
}

/// Load the schema at `path`, pointing at `install-schema` when it is absent.
///
/// # Errors
///
/// Returns an error if the file is missing or not valid JSON.
pub fn require_schema(path: &Path) -> anyhow::Result<Schema> {
    if !path.exists() {
        bail!(
            "no schema at {}, install one with `install-schema <path>` or pass --schema",
            path.display()
        );
    }
    Ok(Schema::load(path)?)
}

/// Everything a command needs for one application.
#[derive(Debug)]
pub struct AppContext {
    /// Application name.
    pub app: String,
    /// Resolved paths.
    pub paths: PathConfig,
    /// Loaded settings.
    pub settings: Settings,
    /// The application's schema.
    pub schema: Schema,
    /// The configuration store.
    pub store: ConfigStore,
}

impl AppContext {
    /// Build the context for `app` from the platform layout.
    ///
    /// # Errors
    ///
    /// See [`AppContext::from_paths`].
    pub fn init(app: &str, opts: &StartupOptions) -> anyhow::Result<Self> {
        let (paths, settings) = PathConfig::resolve(app, opts)?;
        Self::from_paths(app, paths, settings, opts.schema.as_deref())
    }

    /// Build the context from explicit paths.
    ///
    /// When `install_from` is given and no schema exists yet, it is
    /// installed first. The active config is re-validated against the
    /// schema and deactivated with a warning if it no longer passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is missing or invalid, or the store
    /// cannot be opened.
    pub fn from_paths(
        app: &str,
        paths: PathConfig,
        settings: Settings,
        install_from: Option<&Path>,
    ) -> anyhow::Result<Self> {
        if let Some(src) = install_from
            && !paths.schema.exists()
        {
            install_schema(src, &paths.schema, false)?;
        }
        let schema = require_schema(&paths.schema)?;
        let store = ConfigStore::open(&paths.config_dir)?;

        let ctx = Self {
            app: app.to_string(),
            paths,
            settings,
            schema,
            store,
        };
        ctx.revalidate_active()?;
        Ok(ctx)
    }

    fn revalidate_active(&self) -> anyhow::Result<()> {
        match self.store.revalidate_active(&self.schema)? {
            ActiveCheck::Deactivated { name, reason } => {
                eprintln!(
                    "{}",
                    format!("warning: active config `{name}` no longer validates and was deactivated")
                        .yellow()
                );
                eprintln!("{reason}");
            }
            ActiveCheck::Valid(name) => debug!("active config `{name}` is valid"),
            ActiveCheck::Inactive => debug!("no active config"),
        }
        Ok(())
    }

    /// Open `name` for editing with the configured flatten options.
    ///
    /// Missing properties are filled in when `fill_missing_on_open` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded.
    pub fn open_session(&self, name: &str) -> anyhow::Result<EditSession<'_>> {
        let mut session = EditSession::open(&self.store, &self.schema, name)?;
        session.set_options(self.settings.flatten_options());
        if self.settings.fill_missing_on_open {
            let inserted = session.fill_missing();
            if inserted > 0 {
                info!("filled {inserted} missing value(s) in `{name}`");
            }
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_schema(path: &Path) {
        fs::write(
            path,
            r#"{"type": "object", "properties": {"port": {"type": "integer", "minimum": 1, "default": 80}}}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_from_root_layout() {
        let paths = PathConfig::from_root("/cfg/demo");
        assert_eq!(paths.config_dir, Path::new("/cfg/demo/configs"));
        assert_eq!(paths.schema, Path::new("/cfg/demo/schema.json"));
        assert_eq!(paths.settings, Path::new("/cfg/demo/settings.toml"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut paths = PathConfig::from_root("/cfg/demo");
        let settings = Settings {
            config_dir: Some("/srv/a/configs".into()),
            ..Settings::default()
        };
        paths.apply(&settings, None);
        assert_eq!(paths.config_dir, Path::new("/srv/a/configs"));
        assert_eq!(paths.schema, Path::new("/srv/a/schema.json"));

        // 命令行参数优先于设置文件
        paths.apply(&settings, Some(Path::new("/tmp/x/configs")));
        assert_eq!(paths.config_dir, Path::new("/tmp/x/configs"));

        let settings = Settings {
            schema: Some("/etc/schema.json".into()),
            ..Settings::default()
        };
        paths.apply(&settings, None);
        assert_eq!(paths.schema, Path::new("/etc/schema.json"));
    }

    #[test]
    fn test_detect_rejects_bad_app_name() {
        assert!(PathConfig::detect("../etc").is_err());
    }

    #[test]
    fn test_requires_schema() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathConfig::from_root(dir.path());
        let err = AppContext::from_paths("demo", paths, Settings::default(), None).unwrap_err();
        assert!(err.to_string().contains("install-schema"));
    }

    #[test]
    fn test_install_on_startup() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.json");
        write_schema(&src);

        let paths = PathConfig::from_root(dir.path().join("demo"));
        let ctx = AppContext::from_paths("demo", paths, Settings::default(), Some(&src)).unwrap();
        assert!(ctx.paths.schema.exists());
        assert!(ctx.paths.config_dir.is_dir());
        assert_eq!(ctx.store.list().unwrap().len(), 0);
    }

    #[test]
    fn test_install_schema_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.json");
        let dest = dir.path().join("schema.json");
        write_schema(&src);
        install_schema(&src, &dest, false).unwrap();
        assert!(install_schema(&src, &dest, false).is_err());
        install_schema(&src, &dest, true).unwrap();

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[1, 2]").unwrap();
        assert!(install_schema(&bad, &dir.path().join("other.json"), false).is_err());
    }

    #[test]
    fn test_startup_deactivates_invalid_active() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathConfig::from_root(dir.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        write_schema(&paths.schema);

        let ctx =
            AppContext::from_paths("demo", paths.clone(), Settings::default(), None).unwrap();
        ctx.store.create("a", &ctx.schema).unwrap();
        ctx.store.set_active("a", &ctx.schema).unwrap();
        ctx.store.save("a", &json!({"port": 0})).unwrap();
        drop(ctx);

        let ctx = AppContext::from_paths("demo", paths, Settings::default(), None).unwrap();
        assert_eq!(ctx.store.active().unwrap(), None);
        assert!(ctx.store.contains("a"));
    }

    #[test]
    fn test_open_session_fills_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathConfig::from_root(dir.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        write_schema(&paths.schema);
        let settings = Settings {
            fill_missing_on_open: true,
            ..Settings::default()
        };
        let ctx = AppContext::from_paths("demo", paths, settings, None).unwrap();
        ctx.store.save("a", &json!({})).unwrap();

        let session = ctx.open_session("a").unwrap();
        assert_eq!(session.document(), &json!({"port": 80}));
        assert!(session.needs_save());
    }
}
