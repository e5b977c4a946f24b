//! # cfgman
//!
//! Command line manager for directories of schema-validated JSON
//! configurations, built on [`cfgtree`].
//!
//! Each application gets a root under the platform config directory:
//!
//! ```text
//! <config dir>/<app>/
//!     schema.json      the schema every config must satisfy
//!     settings.toml    optional tool settings
//!     configs/         one <name>.json per config, plus the `active` record
//! ```
//!
//! ## Modules
//!
//! - [`commands`] - Command line definition and handlers
//! - [`ctx`] - Application context and path detection
//! - [`render`] - Terminal output
//! - [`settings`] - Settings file

#[macro_use]
extern crate log;

/// Command line definition and per-command handlers.
pub mod commands;

/// Application context and path detection.
pub mod ctx;

/// Terminal output.
pub mod render;

/// Per-application settings file.
pub mod settings;

pub use commands::{Cli, Command, run};
pub use ctx::AppContext;
