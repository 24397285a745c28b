use clap::Args;
use serde_json::{json, Value};

use risk_engine_core::engine::{run_treatment_analysis, TreatmentAnalysisInput};
use risk_engine_core::treatment;

use crate::input;

/// Arguments for a simulated treatment analysis
#[derive(Args)]
pub struct TreatmentArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the number of iterations per stage
    #[arg(long)]
    pub num_simulations: Option<usize>,
}

/// Arguments for ROI from known annual loss expectancies
#[derive(Args)]
pub struct RoiArgs {
    /// Annual loss expectancy with current controls
    #[arg(long)]
    pub current_ale: f64,

    /// Annual loss expectancy after treatment
    #[arg(long)]
    pub residual_ale: f64,

    /// Cost of the treatment
    #[arg(long)]
    pub cost: f64,
}

pub fn run_treatment(args: TreatmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut t_input: TreatmentAnalysisInput =
        input::load(args.input.as_deref(), "treatment analysis")?;
    if let Some(n) = args.num_simulations {
        t_input.num_simulations = n;
    }
    let result = run_treatment_analysis(&t_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_roi(args: RoiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let outcome = treatment::roi(args.current_ale, args.residual_ale, args.cost);
    Ok(json!({
        "result": {
            "current_ale": args.current_ale,
            "residual_ale": args.residual_ale,
            "risk_reduction": args.current_ale - args.residual_ale,
            "treatment_cost": args.cost,
            "roi": outcome,
        }
    }))
}
