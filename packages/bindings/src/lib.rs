use napi::Result as NapiResult;
use napi_derive::napi;

use risk_engine_core::engine;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_risk_scenarios(input_json: String) -> NapiResult<String> {
    let input: engine::RiskSimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_risk_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sum_loss_exceedance_curves(input_json: String) -> NapiResult<String> {
    let input: engine::CurveAggregationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_curve_aggregation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[napi]
pub fn risk_tolerance_curve(input_json: String) -> NapiResult<String> {
    let input: engine::RiskToleranceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_risk_tolerance_curve(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Treatment
// ---------------------------------------------------------------------------

#[napi]
pub fn treatment_analysis(input_json: String) -> NapiResult<String> {
    let input: engine::TreatmentAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_treatment_analysis(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// ROI from already-known ALEs. Returns `{"status": ..., ...}`.
#[napi]
pub fn calculate_roi(current_ale: f64, residual_ale: f64, treatment_cost: f64) -> NapiResult<String> {
    let outcome = risk_engine_core::treatment::roi(current_ale, residual_ale, treatment_cost);
    serde_json::to_string(&outcome).map_err(to_napi_error)
}
