use serde_json::Value;

/// Headline fields, in order of priority.
const PRIORITY_KEYS: [&str; 7] = [
    "irr",
    "base_case_value",
    "moic",
    "ending_balance",
    "purchase_price",
    "factor",
    "exit_enterprise_value",
];

/// Print just the key answer value from the output.
///
/// Looks for a headline field in the result, then one level down (so the
/// full model reports its exit IRR), then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(val) = headline(result_obj) {
        println!("{}", format_minimal(val));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

/// Headline field of a result, or of its first nested object that has one.
fn headline(value: &Value) -> Option<&Value> {
    find_headline(value).or_else(|| {
        value
            .as_object()
            .and_then(|m| m.values().find_map(find_headline))
    })
}

fn find_headline(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
