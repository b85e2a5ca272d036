use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{irr_display, NOT_AVAILABLE};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => {
            println!("{}", array_table(arr));
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        _ => print_object(envelope),
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars (and flattened nested objects) as a Field/Value table, then one
/// titled table per array of row objects, e.g. the yearly cash flows.
fn print_object(map: &Map<String, Value>) {
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut row_tables: Vec<(String, &Vec<Value>)> = Vec::new();
    collect_fields("", map, &mut fields, &mut row_tables);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &fields {
        builder.push_record([key.as_str(), val.as_str()]);
    }
    println!("{}", Table::from(builder));

    for (title, rows) in row_tables {
        println!("\n{}:", title);
        println!("{}", array_table(rows));
    }
}

fn collect_fields<'a>(
    prefix: &str,
    map: &'a Map<String, Value>,
    fields: &mut Vec<(String, String)>,
    row_tables: &mut Vec<(String, &'a Vec<Value>)>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
                row_tables.push((name, arr));
            }
            Value::Object(inner) if irr_display(val).is_none() => {
                collect_fields(&name, inner, fields, row_tables);
            }
            _ => fields.push((name, format_value(val))),
        }
    }
}

fn array_table(arr: &[Value]) -> String {
    if arr.is_empty() {
        return "(empty)".to_string();
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        Table::from(builder).to_string()
    } else {
        arr.iter().map(format_value).collect::<Vec<_>>().join("\n")
    }
}

fn format_value(value: &Value) -> String {
    if let Some(irr) = irr_display(value) {
        return irr;
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
