use serde_json::{Map, Value};
use std::io;

use super::{format_scalar, result_of};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Simulation results become a `scenario,loss,probability` long table,
/// bare curves a `loss,probability` table, anything else `field,value`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(result) => {
            if let Some(Value::Object(results)) = result.get("results") {
                write_scenario_curves(&mut wtr, results);
            } else if let Some(curve) = curve_columns(result) {
                write_curve(&mut wtr, None, curve);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
        }
        other => {
            let _ = wtr.write_record([&format_scalar(other)]);
        }
    }

    let _ = wtr.flush();
}

/// Loss/probability columns of a curve payload, in either naming.
fn curve_columns(obj: &Map<String, Value>) -> Option<(&[Value], &[Value])> {
    let obj = match obj.get("curve") {
        Some(Value::Object(inner)) => inner,
        _ => obj,
    };
    let pick = |a: &str, b: &str| match obj.get(a).or_else(|| obj.get(b)) {
        Some(Value::Array(arr)) => Some(arr.as_slice()),
        _ => None,
    };
    Some((
        pick("loss", "loss_values")?,
        pick("probability", "exceedance_probabilities")?,
    ))
}

fn write_scenario_curves(wtr: &mut StdoutWriter<'_>, results: &Map<String, Value>) {
    let _ = wtr.write_record(["scenario", "loss", "probability"]);
    for (name, payload) in results {
        if let Some(curve) = payload.as_object().and_then(curve_columns) {
            write_rows(wtr, Some(name.as_str()), curve);
        }
    }
}

fn write_curve(wtr: &mut StdoutWriter<'_>, name: Option<&str>, curve: (&[Value], &[Value])) {
    let _ = wtr.write_record(["loss", "probability"]);
    write_rows(wtr, name, curve);
}

fn write_rows(wtr: &mut StdoutWriter<'_>, name: Option<&str>, (loss, prob): (&[Value], &[Value])) {
    for (l, p) in loss.iter().zip(prob) {
        let _ = match name {
            Some(n) => wtr.write_record([n, &format_scalar(l), &format_scalar(p)]),
            None => wtr.write_record([format_scalar(l), format_scalar(p)]),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_curve_columns_payload_naming() {
        let v = json!({ "loss": [1.0, 2.0], "probability": [1.0, 0.5] });
        let (l, p) = curve_columns(v.as_object().unwrap()).unwrap();
        assert_eq!((l.len(), p.len()), (2, 2));
    }

    #[test]
    fn test_curve_columns_nested_curve() {
        let v = json!({ "curve": { "loss_values": [3.0], "exceedance_probabilities": [1.0] } });
        assert!(curve_columns(v.as_object().unwrap()).is_some());
    }

    #[test]
    fn test_curve_columns_absent() {
        let v = json!({ "roi": 1.0 });
        assert!(curve_columns(v.as_object().unwrap()).is_none());
    }
}
