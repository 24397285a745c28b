use clap::Args;
use serde_json::Value;

use risk_engine_core::engine::{run_risk_tolerance_curve, RiskToleranceInput};
use risk_engine_core::tolerance::curve::DEFAULT_POINTS;
use risk_engine_core::TolerancePoint;

use crate::input;

/// Arguments for the risk tolerance curve
#[derive(Args)]
pub struct ToleranceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated first appetite point: probability,loss (e.g. "0.5,10000")
    #[arg(long, value_delimiter = ',')]
    pub point1: Option<Vec<f64>>,

    /// Comma-separated second appetite point: probability,loss
    #[arg(long, value_delimiter = ',')]
    pub point2: Option<Vec<f64>>,

    /// Number of rendered curve points
    #[arg(long, default_value_t = DEFAULT_POINTS)]
    pub points: usize,
}

fn tolerance_point(raw: &[f64]) -> Result<TolerancePoint, Box<dyn std::error::Error>> {
    match raw {
        [probability, acceptable_loss] => Ok(TolerancePoint {
            probability: *probability,
            acceptable_loss: *acceptable_loss,
        }),
        _ => Err("a tolerance point needs exactly 'probability,loss'".into()),
    }
}

pub fn run_tolerance(args: ToleranceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tol_input = match (&args.point1, &args.point2) {
        (Some(p1), Some(p2)) => RiskToleranceInput {
            points: [tolerance_point(p1)?, tolerance_point(p2)?],
            num_points: args.points,
        },
        _ => input::load(args.input.as_deref(), "risk tolerance curve")?,
    };
    let result = run_risk_tolerance_curve(&tol_input)?;
    Ok(serde_json::to_value(result)?)
}
