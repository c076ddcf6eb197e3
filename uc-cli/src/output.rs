//! Output formatting for the `uc` CLI: colored human messages, a small
//! table builder, and a JSON passthrough for `--format json`.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;
use std::fmt::Display;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored, human-readable output.
    Human,
    /// JSON for scripting.
    Json,
    /// Plain text, no colors.
    Plain,
}

/// Print a success message (Human/Plain only; no-op under Json).
pub fn success(format: OutputFormat, msg: impl Display) {
    match format {
        OutputFormat::Human => println!("{} {}", style("✓").green().bold(), msg),
        OutputFormat::Plain => println!("{msg}"),
        OutputFormat::Json => {}
    }
}

/// Print an error message to stderr.
pub fn error(format: OutputFormat, msg: impl Display) {
    match format {
        OutputFormat::Human => eprintln!("{} {}", style("✗").red().bold(), msg),
        _ => eprintln!("{msg}"),
    }
}

/// Print a warning message.
pub fn warning(format: OutputFormat, msg: impl Display) {
    match format {
        OutputFormat::Human => println!("{} {}", style("⚠").yellow().bold(), msg),
        OutputFormat::Plain => println!("{msg}"),
        OutputFormat::Json => {}
    }
}

/// Print a key-value pair under Human/Plain.
pub fn kv(format: OutputFormat, key: impl Display, value: impl Display) {
    match format {
        OutputFormat::Human => println!("  {}: {}", style(key).cyan(), value),
        OutputFormat::Plain => println!("{key}: {value}"),
        OutputFormat::Json => {}
    }
}

/// A small row-building wrapper around `comfy_table::Table`.
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { table }
    }

    pub fn header<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Display,
    {
        let row: Vec<Cell> = headers.into_iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
        self.table.set_header(row);
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Display,
    {
        let row: Vec<Cell> = cells.into_iter().map(Cell::new).collect();
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> Table {
        self.table
    }

    pub fn print(self) {
        println!("{}", self.table);
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize `data` to stdout, pretty-printed regardless of format: every
/// subcommand's primary payload is structured, so Human/Plain both fall
/// back to JSON for it.
pub fn emit<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_builder_tracks_row_count() {
        let table = TableBuilder::new()
            .header(vec!["id", "disposition"])
            .row(vec!["1", "Preserved"])
            .row(vec!["2", "Compressible"])
            .build();
        assert_eq!(table.row_count(), 2);
    }
}
