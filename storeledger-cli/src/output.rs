//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Print an indented list item
pub fn bullet(msg: &str) {
    println!("  {} {}", "•".yellow(), msg);
}

/// Two-column table of labels and values
pub fn summary_table<L, V>(rows: impl IntoIterator<Item = (L, V)>) -> Table
where
    L: Into<String>,
    V: ToString,
{
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label.into()), Cell::new(value.to_string())]);
    }
    table
}
