use clap::Args;
use serde_json::Value;

use risk_engine_core::engine::{run_curve_aggregation, CurveAggregationInput};

use crate::input;

/// Arguments for combining stored exceedance curves
#[derive(Args)]
pub struct AggregateArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_aggregate(args: AggregateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let agg_input: CurveAggregationInput =
        input::load(args.input.as_deref(), "curve aggregation")?;
    let result = run_curve_aggregation(&agg_input)?;
    Ok(serde_json::to_value(result)?)
}
