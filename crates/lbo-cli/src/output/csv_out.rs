use serde_json::{Map, Value};
use std::io;

use super::is_row_array;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A sensitivity result is written as a grid, a result holding one schedule
/// as that schedule, and anything else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            write_object_csv(&mut wtr, result);
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    if let Err(e) = wtr.flush() {
        log::error!("CSV flush failed: {}", e);
    }
}

fn write_object_csv(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    if let Some(Value::Array(matrix)) = map.get("matrix") {
        write_grid_csv(wtr, map, matrix);
        return;
    }

    let row_arrays: Vec<&Vec<Value>> = map
        .values()
        .filter(|v| is_row_array(v))
        .filter_map(Value::as_array)
        .collect();
    if let [rows] = row_arrays.as_slice() {
        write_array_csv(wtr, rows);
        return;
    }

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    let _ = wtr.write_record([format!("{key}.{inner_key}"), format_csv_value(inner_val)]);
                }
            }
            _ => {
                let _ = wtr.write_record([key.clone(), format_csv_value(val)]);
            }
        }
    }
}

/// Sensitivity matrix: header row of variable 2 values, one row per
/// variable 1 value.
fn write_grid_csv(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>, matrix: &[Value]) {
    let empty = Vec::new();
    let v1_values = map
        .get("variable_1_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let v2_values = map
        .get("variable_2_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let corner = format!(
        "{}\\{}",
        map.get("variable_1").map(format_csv_value).unwrap_or_default(),
        map.get("variable_2").map(format_csv_value).unwrap_or_default()
    );

    let header: Vec<String> = std::iter::once(corner)
        .chain(v2_values.iter().map(format_csv_value))
        .collect();
    let _ = wtr.write_record(&header);

    for (label, row) in v1_values.iter().zip(matrix) {
        let cells = row.as_array().map(Vec::as_slice).unwrap_or(&[]);
        let record: Vec<String> = std::iter::once(format_csv_value(label))
            .chain(cells.iter().map(format_csv_value))
            .collect();
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
