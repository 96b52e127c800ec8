pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Print an advisory note to stderr.
pub fn warn(message: &str) {
    eprintln!("{}: {}", "warning".yellow().bold(), message);
}

/// Echo the envelope's warnings to stderr. Table output renders them itself.
pub fn echo_warnings(format: &OutputFormat, value: &Value) {
    if matches!(format, OutputFormat::Table) {
        return;
    }
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings.iter().filter_map(Value::as_str) {
            warn(w);
        }
    }
}

/// First field of `result` holding a non-empty array of objects, e.g. the
/// per-SKU rows of an impact run.
pub(crate) fn primary_rows(result: &serde_json::Map<String, Value>) -> Option<(&str, &[Value])> {
    result.iter().find_map(|(key, val)| match val {
        Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))) => {
            Some((key.as_str(), arr.as_slice()))
        }
        _ => None,
    })
}
