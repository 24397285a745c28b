use serde_json::Value;

use super::{format_scalar, result_of};

/// Headline fields in order of priority.
const PRIORITY_KEYS: [&str; 6] = ["roi", "risk_reduction", "mean", "fitted", "stage", "loss_values"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(result_of(value)));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return format_scalar(result);
    };

    for key in PRIORITY_KEYS {
        match map.get(key) {
            // ROI outcomes are tagged; show the number or the reason.
            Some(Value::Object(roi)) if key == "roi" => {
                return roi
                    .get("roi")
                    .or_else(|| roi.get("reason"))
                    .map(format_scalar)
                    .unwrap_or_default();
            }
            Some(val) if !val.is_null() => return format_scalar(val),
            _ => {}
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_scalar(val)),
        None => String::new(),
    }
}
