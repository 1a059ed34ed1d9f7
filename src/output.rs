//! Rendering of command results as tables or raw JSON.

use clap::ValueEnum;
use comfy_table::{presets, Cell, Table};
use serde_json::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One table column: header plus the dot-notation path into each item.
pub struct Column {
    pub header: &'static str,
    pub path: &'static str,
}

pub const fn col(header: &'static str, path: &'static str) -> Column {
    Column { header, path }
}

/// Print a listing, either as a table over the given columns or as a JSON
/// array.
pub fn print_items(items: &[Value], columns: &[Column], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&Value::Array(items.to_vec()))
                    .unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(presets::UTF8_BORDERS_ONLY);
            table.set_header(columns.iter().map(|c| Cell::new(c.header)));
            for item in items {
                table.add_row(columns.iter().map(|c| extract_json_value(item, c.path)));
            }
            println!("{table}");
            eprintln!("{} item(s)", items.len());
        }
    }
}

/// Print a single resource. Tables render as key/value rows of the top-level
/// fields.
pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
            );
        }
        OutputFormat::Table => {
            let Some(object) = value.as_object() else {
                println!("{}", extract_json_value(value, ""));
                return;
            };
            let mut table = Table::new();
            table.load_preset(presets::UTF8_BORDERS_ONLY);
            table.set_header(["FIELD", "VALUE"]);
            for (key, field) in object {
                table.add_row([key.clone(), extract_json_value(field, "")]);
            }
            println!("{table}");
        }
    }
}

/// Extract a value from JSON using a dot-notation path. Numeric path
/// segments index into arrays. An empty path renders the value itself.
/// Missing fields render as `-`.
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    if !path.is_empty() {
        for part in path.split('.') {
            let next = if let Ok(index) = part.parse::<usize>() {
                current.get(index)
            } else {
                current.get(part)
            };
            current = match next {
                Some(v) => v,
                None => return "-".to_string(),
            };
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
