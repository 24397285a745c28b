use clap::Args;
use serde_json::{json, Value};

use risk_engine_core::distribution::fit_ci90;

/// Arguments for fitting a severity distribution to a 90% interval
#[derive(Args)]
pub struct FitArgs {
    /// 5th percentile loss
    #[arg(long)]
    pub lb: f64,

    /// 95th percentile loss
    #[arg(long)]
    pub ub: f64,
}

pub fn run_fit(args: FitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fitted = fit_ci90(args.lb, args.ub)?;
    Ok(json!({
        "result": {
            "fitted": fitted,
            "mean": fitted.mean(),
            "median": fitted.median(),
            "std_dev": fitted.std_dev(),
            "p05": fitted.quantile(0.05),
            "p95": fitted.quantile(0.95),
            "p99": fitted.quantile(0.99),
        }
    }))
}
