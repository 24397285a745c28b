use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Arrays longer than this are summarised instead of printed in full.
const MAX_INLINE_VALUES: usize = 8;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        _ => println!("{}", format_value(value)),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            match res_map.get("results") {
                // Simulation output: one metrics row per scenario.
                Some(Value::Object(results)) if !results.is_empty() => {
                    print_flat_object(&without(res_map, "results"));
                    println!();
                    print_metrics_table(results);
                }
                _ => print_flat_object(res_map),
            }
        }
        _ => print_flat_object(envelope),
    }

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

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

const METRIC_COLUMNS: [&str; 7] = [
    "mean",
    "median",
    "var_95",
    "var_99",
    "expected_shortfall_99",
    "max_loss",
    "prob_zero_loss",
];

fn print_metrics_table(results: &Map<String, Value>) {
    let mut builder = Builder::default();
    let mut header = vec!["Scenario".to_string()];
    header.extend(METRIC_COLUMNS.iter().map(|c| c.to_string()));
    builder.push_record(header);

    for (name, payload) in results {
        let metrics = payload.get("metrics");
        let mut row = vec![name.clone()];
        row.extend(METRIC_COLUMNS.iter().map(|c| {
            metrics
                .and_then(|m| m.get(*c))
                .map(format_value)
                .unwrap_or_else(|| "-".to_string())
        }));
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn without(map: &Map<String, Value>, key: &str) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) if arr.len() > MAX_INLINE_VALUES => {
            format!("[{} values]", arr.len())
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
