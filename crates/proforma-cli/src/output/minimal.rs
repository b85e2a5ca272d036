use serde_json::Value;

use super::{irr_display, NOT_AVAILABLE};

/// Priority list of key output fields, searched in the result and then in a
/// nested `returns` object.
const PRIORITY_KEYS: [&str; 6] = [
    "irr",
    "equity_multiple",
    "exit_value",
    "payment",
    "total_free_cash_flow",
    "minimum_dscr",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

fn minimal_text(value: &Value) -> String {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let nested_returns = result_obj.get("returns");

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            let found = map
                .get(key)
                .or_else(|| nested_returns.and_then(|r| r.get(key)));
            if let Some(val) = found {
                return format_minimal(val);
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    if let Some(irr) = irr_display(value) {
        return irr;
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => NOT_AVAILABLE.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
