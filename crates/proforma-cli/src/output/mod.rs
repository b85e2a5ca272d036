pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Marker printed wherever a metric is mathematically undefined.
pub const NOT_AVAILABLE: &str = "N/A";

/// Render a serialised `IrrOutcome` (`{"status": ...}`) as its rate or N/A.
/// Returns None for any other value.
pub fn irr_display(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    match map.get("status")?.as_str()? {
        "converged" => map.get("rate").map(scalar_text),
        "undefined" => {
            let kind = map
                .get("reason")
                .and_then(|r| r.get("kind"))
                .and_then(Value::as_str)
                .unwrap_or("undefined");
            Some(format!("{NOT_AVAILABLE} ({kind})"))
        }
        _ => None,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
