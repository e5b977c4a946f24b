//! Command line definition and per-command handlers.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use cfgtree::{ConfigError, Pointer};
use clap::{Parser, Subcommand};

use crate::{
    ctx::{AppContext, PathConfig, StartupOptions, install_schema},
    render,
};

/// Manage schema-validated JSON configurations.
#[derive(Parser, Debug)]
#[command(name = "cfgman", version, about)]
pub struct Cli {
    /// Application whose configurations are managed.
    pub app: String,

    /// Use this configuration directory instead of the default.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Schema to install when the application has none yet.
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Path overrides to hand to [`AppContext::init`].
    pub fn startup_options(&self) -> StartupOptions {
        StartupOptions {
            config_dir: self.config_dir.clone(),
            schema: self.schema.clone(),
        }
    }
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List stored configs, marking the active one.
    List,
    /// Print the name of the active config.
    Active,
    /// Create a config filled with schema defaults.
    New { name: String },
    /// Print a config as an indented node tree.
    Show {
        name: String,
        /// Print the raw JSON document instead.
        #[arg(long)]
        json: bool,
    },
    /// Print the value at a JSON pointer.
    Get { name: String, pointer: String },
    /// Set the value at a JSON pointer.
    ///
    /// Strings are taken verbatim; other types are parsed from the text.
    Set {
        name: String,
        pointer: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Append a default element to an array.
    Append { name: String, pointer: String },
    /// Remove an array element.
    Remove { name: String, pointer: String },
    /// Validate a config against the schema.
    Validate { name: String },
    /// Make a config the active one; it must validate.
    Activate { name: String },
    /// Clear the active config.
    Deactivate,
    /// Delete a config.
    Delete { name: String },
    /// Insert defaults for properties the config is missing.
    Repair { name: String },
    /// Install a schema file for the application.
    InstallSchema {
        path: PathBuf,
        /// Replace an existing schema.
        #[arg(long)]
        force: bool,
    },
}

/// Entry point shared by the binary and tests.
///
/// `install-schema` runs before the context is built, since every other
/// command requires a schema.
///
/// # Errors
///
/// Any error of the selected command.
pub fn run(app: &str, opts: &StartupOptions, command: Command, out: &mut dyn Write) -> Result<()> {
    if let Command::InstallSchema { path, force } = &command {
        let (paths, _) = PathConfig::resolve(app, opts)?;
        return handle_install_schema(&paths, path, *force, out);
    }
    let ctx = AppContext::init(app, opts)?;
    CommandHandler::new(&ctx, out).handle(command)
}

/// Installs `src` as the schema at `paths.schema`.
///
/// Shared by [`run`], which installs before any schema exists, and
/// [`CommandHandler::handle`], which replaces the schema of a running
/// context.
fn handle_install_schema(
    paths: &PathConfig,
    src: &Path,
    force: bool,
    out: &mut dyn Write,
) -> Result<()> {
    install_schema(src, &paths.schema, force)?;
    render::success(out, &format!("installed schema {}", paths.schema.display()))?;
    Ok(())
}

fn parse_pointer(text: &str) -> Result<Pointer> {
    Ok(Pointer::parse(text)?)
}

/// Runs commands against one application context.
pub struct CommandHandler<'a> {
    ctx: &'a AppContext,
    out: &'a mut dyn Write,
}

impl<'a> CommandHandler<'a> {
    pub fn new(ctx: &'a AppContext, out: &'a mut dyn Write) -> Self {
        Self { ctx, out }
    }

    /// Handles one command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; nothing is written to disk in
    /// that case.
    pub fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::List => self.handle_list(),
            Command::Active => self.handle_active(),
            Command::New { name } => self.handle_new(&name),
            Command::Show { name, json } => self.handle_show(&name, json),
            Command::Get { name, pointer } => self.handle_get(&name, &pointer),
            Command::Set {
                name,
                pointer,
                value,
            } => self.handle_set(&name, &pointer, &value),
            Command::Append { name, pointer } => self.handle_append(&name, &pointer),
            Command::Remove { name, pointer } => self.handle_remove(&name, &pointer),
            Command::Validate { name } => self.handle_validate(&name),
            Command::Activate { name } => self.handle_activate(&name),
            Command::Deactivate => self.handle_deactivate(),
            Command::Delete { name } => self.handle_delete(&name),
            Command::Repair { name } => self.handle_repair(&name),
            Command::InstallSchema { path, force } => {
                handle_install_schema(&self.ctx.paths, &path, force, self.out)
            }
        }
    }

    fn handle_list(&mut self) -> Result<()> {
        let names = self.ctx.store.list()?;
        let active = self.ctx.store.active()?;
        render::config_list(self.out, &names, active.as_deref())?;
        Ok(())
    }

    fn handle_active(&mut self) -> Result<()> {
        match self.ctx.store.active()? {
            Some(name) => writeln!(self.out, "{name}")?,
            None => render::warning(self.out, "no active config")?,
        }
        Ok(())
    }

    fn handle_new(&mut self, name: &str) -> Result<()> {
        self.ctx.store.create(name, &self.ctx.schema)?;
        render::success(self.out, &format!("created `{name}`"))?;
        Ok(())
    }

    fn handle_show(&mut self, name: &str, json: bool) -> Result<()> {
        let session = self.ctx.open_session(name)?;
        if json {
            render::value(self.out, session.document())?;
        } else {
            render::tree(self.out, &session)?;
        }
        Ok(())
    }

    fn handle_get(&mut self, name: &str, pointer: &str) -> Result<()> {
        let pointer = parse_pointer(pointer)?;
        let document = self.ctx.store.load(name)?;
        let Some(value) = pointer.get(&document) else {
            return Err(ConfigError::not_found(format!("value at {pointer} in `{name}`")).into());
        };
        render::value(self.out, value)?;
        Ok(())
    }

    fn handle_set(&mut self, name: &str, pointer: &str, input: &str) -> Result<()> {
        let pointer = parse_pointer(pointer)?;
        let mut session = self.ctx.open_session(name)?;
        session.set_from_input(&pointer, input)?;
        session.save(&self.ctx.store)?;

        let violations = session.validate()?;
        if let Some(violation) = violations.first_under(&pointer) {
            render::warning(self.out, &format!("saved, but {violation}"))?;
        } else {
            render::success(self.out, &format!("set {pointer} in `{name}`"))?;
        }
        Ok(())
    }

    fn handle_append(&mut self, name: &str, pointer: &str) -> Result<()> {
        let pointer = parse_pointer(pointer)?;
        let mut session = self.ctx.open_session(name)?;
        let added = session.append(&pointer)?;
        session.save(&self.ctx.store)?;
        render::success(self.out, &format!("appended {added}"))?;
        Ok(())
    }

    fn handle_remove(&mut self, name: &str, pointer: &str) -> Result<()> {
        let pointer = parse_pointer(pointer)?;
        let mut session = self.ctx.open_session(name)?;
        session.remove(&pointer)?;
        session.save(&self.ctx.store)?;
        render::success(self.out, &format!("removed {pointer}"))?;
        Ok(())
    }

    fn handle_validate(&mut self, name: &str) -> Result<()> {
        let document = self.ctx.store.load(name)?;
        let violations = self.ctx.schema.validate(&document)?;
        if violations.is_empty() {
            render::success(self.out, &format!("`{name}` is valid"))?;
            return Ok(());
        }
        render::report(self.out, &violations)?;
        bail!("`{name}` has {} violation(s)", violations.len());
    }

    fn handle_activate(&mut self, name: &str) -> Result<()> {
        self.ctx
            .store
            .set_active(name, &self.ctx.schema)
            .with_context(|| format!("failed to activate `{name}`"))?;
        render::success(self.out, &format!("`{name}` is now active"))?;
        Ok(())
    }

    fn handle_deactivate(&mut self) -> Result<()> {
        self.ctx.store.deactivate()?;
        render::success(self.out, "no config is active")?;
        Ok(())
    }

    fn handle_delete(&mut self, name: &str) -> Result<()> {
        self.ctx.store.delete(name)?;
        render::success(self.out, &format!("deleted `{name}`"))?;
        Ok(())
    }

    fn handle_repair(&mut self, name: &str) -> Result<()> {
        let mut session = self.ctx.open_session(name)?;
        let inserted = session.fill_missing();
        if session.needs_save() {
            session.save(&self.ctx.store)?;
        }
        render::success(
            self.out,
            &format!("inserted {inserted} missing value(s) into `{name}`"),
        )?;
        Ok(())
    }
}
