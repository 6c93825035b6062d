//! Output formatting: table or JSON.
//!
//! Backend payloads are schemaless JSON, so tables are built from the keys
//! of the first row instead of a `Tabled` derive.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render typed rows: `Tabled` for tables, serde for JSON.
pub fn render_list<T, R>(format: OutputFormat, data: &[T], to_row: impl Fn(&T) -> R) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
    }
}

/// Render a single typed item; table mode uses the pre-formatted detail.
pub fn render_single<T: serde::Serialize>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> String {
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
    }
}

/// Render a backend response body.
///
/// In table mode the `data` field of an `{ success, data }` envelope is
/// unwrapped; arrays of objects become a table, objects a key/value list.
pub fn render_value(format: OutputFormat, body: &Value) -> String {
    match format {
        OutputFormat::Json => render_json(body, false),
        OutputFormat::JsonCompact => render_json(body, true),
        OutputFormat::Table => {
            let data = body.get("data").unwrap_or(body);
            match data {
                Value::Array(items) => render_array(items),
                Value::Object(map) => render_object(map),
                other => scalar(other),
            }
        }
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_default()
}

fn render_array(items: &[Value]) -> String {
    if items.is_empty() {
        return "(no results)".into();
    }

    let Some(Value::Object(first)) = items.first() else {
        return items.iter().map(scalar).collect::<Vec<_>>().join("\n");
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| (*c).clone()));
    for item in items {
        builder.push_record(
            columns
                .iter()
                .map(|c| item.get(c.as_str()).map(scalar).unwrap_or_default()),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_object(map: &serde_json::Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field".to_owned(), "Value".to_owned()]);
    for (key, value) in map {
        builder.push_record([key.clone(), scalar(value)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// One-cell rendering: strings unquoted, nested values as compact JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
