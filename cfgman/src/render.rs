//! Terminal output for configs, node trees and violation reports.

use std::{collections::BTreeSet, io::Write};

use cfgtree::{session::EditSession, validate::ViolationReport};
use colored::Colorize;
use serde_json::Value;

/// Stored config names, the active one marked with `*`.
pub fn config_list(
    out: &mut dyn Write,
    names: &BTreeSet<String>,
    active: Option<&str>,
) -> std::io::Result<()> {
    if names.is_empty() {
        writeln!(out, "{}", "no configs".dimmed())?;
        return Ok(());
    }
    for name in names {
        if Some(name.as_str()) == active {
            writeln!(out, "{} {}", "*".green().bold(), name.green())?;
        } else {
            writeln!(out, "  {name}")?;
        }
    }
    Ok(())
}

/// One line per node, indented by depth, leaves with their preview and the
/// kind of input they take.
pub fn tree(out: &mut dyn Write, session: &EditSession<'_>) -> std::io::Result<()> {
    let mut lines = Vec::with_capacity(session.nodes().len());
    session.render(|view| {
        let marker = if view.selected { ">" } else { " " };
        let line = if view.node.preview.is_some() {
            format!(
                "{marker}{}  {}",
                view.node.display(),
                format!("<{}>", view.affordance.as_str()).dimmed()
            )
        } else {
            format!("{marker}{}", view.node.display().bold())
        };
        lines.push(line);
    });
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Numbered violations in red.
pub fn report(out: &mut dyn Write, report: &ViolationReport) -> std::io::Result<()> {
    for (i, violation) in report.iter().enumerate() {
        writeln!(out, "{}", format!("[{}] {violation}", i + 1).red())?;
    }
    Ok(())
}

/// Pretty JSON of a single value.
pub fn value(out: &mut dyn Write, value: &Value) -> std::io::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    writeln!(out, "{text}")
}

/// A green status line.
pub fn success(out: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(out, "{}", message.green())
}

/// A yellow status line.
pub fn warning(out: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(out, "{}", message.yellow())
}
