use clap::{Args, ValueEnum};
use serde_json::Value;

use risk_engine_core::engine::{run_risk_simulation, RiskSimulationInput};
use risk_engine_core::RiskStage;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StageArg {
    Inherent,
    Current,
    Residual,
}

impl From<StageArg> for RiskStage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Inherent => RiskStage::Inherent,
            StageArg::Current => RiskStage::Current,
            StageArg::Residual => RiskStage::Residual,
        }
    }
}

/// Arguments for scenario / portfolio simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the number of iterations
    #[arg(long)]
    pub num_simulations: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the risk stage (selects the default seed)
    #[arg(long, value_enum)]
    pub stage: Option<StageArg>,

    /// Maximum number of points per returned curve
    #[arg(long)]
    pub max_curve_points: Option<usize>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sim_input: RiskSimulationInput =
        input::load(args.input.as_deref(), "risk simulation")?;

    if let Some(n) = args.num_simulations {
        sim_input.num_simulations = n;
    }
    if let Some(seed) = args.seed {
        sim_input.seed = Some(seed);
    }
    if let Some(stage) = args.stage {
        sim_input.stage = stage.into();
    }
    if let Some(points) = args.max_curve_points {
        sim_input.max_curve_points = points;
    }

    let result = run_risk_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
