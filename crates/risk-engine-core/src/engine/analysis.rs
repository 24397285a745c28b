//! Entry points consumed by the orchestration layer. Each takes a serde
//! input struct and returns a [`ComputationOutput`] envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::analytics::exceedance::{ExceedanceCurve, DEFAULT_MAX_POINTS};
use crate::analytics::metrics::{self, empty_when_none, RiskMetrics};
use crate::distribution::{fit_ci90, FittedLognormal};
use crate::error::RiskEngineError;
use crate::simulation::portfolio::{sample_portfolio, PortfolioLosses, SamplingMode};
use crate::types::{
    with_metadata, ComputationOutput, RiskStage, ScenarioParameters, PORTFOLIO_TOTAL,
};
use crate::RiskEngineResult;

/// Smallest accepted iteration count.
pub const MIN_SIMULATIONS: usize = 100;

fn default_num_simulations() -> usize {
    100_000
}

fn default_max_curve_points() -> usize {
    DEFAULT_MAX_POINTS
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Simulation request for one risk stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSimulationInput {
    pub scenarios: Vec<ScenarioParameters>,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
    /// Falls back to the stage's default seed.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub stage: RiskStage,
    #[serde(default)]
    pub correlation_matrix: Option<Vec<Vec<f64>>>,
    /// Curve payload size cap; metrics always use the full sample.
    #[serde(default = "default_max_curve_points")]
    pub max_curve_points: usize,
}

/// What produced a payload entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParametersUsed {
    Scenario {
        scenario: ScenarioParameters,
        fitted: FittedLognormal,
        seed: u64,
        num_simulations: usize,
    },
    Portfolio {
        scenario_count: usize,
        mode: SamplingMode,
        seed: u64,
        num_simulations: usize,
    },
}

/// Downsampled curve, metrics and provenance for a scenario or the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePayload {
    pub loss: Vec<f64>,
    pub probability: Vec<f64>,
    #[serde(with = "empty_when_none")]
    pub metrics: Option<RiskMetrics>,
    pub parameters_used: ParametersUsed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSimulationOutput {
    pub stage: RiskStage,
    pub seed: u64,
    pub num_simulations: usize,
    pub mode: SamplingMode,
    /// Keyed by scenario name, plus `Portfolio_Total`. Empty when no
    /// scenarios were supplied.
    pub results: BTreeMap<String, CurvePayload>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_num_simulations(n: usize) -> RiskEngineResult<()> {
    if n < MIN_SIMULATIONS {
        return Err(RiskEngineError::invalid(
            "num_simulations",
            format!("Must be at least {MIN_SIMULATIONS}, got {n}"),
        ));
    }
    Ok(())
}

fn payload(
    losses: &[f64],
    probability: Option<f64>,
    max_points: usize,
    parameters_used: ParametersUsed,
) -> CurvePayload {
    let curve = ExceedanceCurve::build(losses).downsample(max_points);
    CurvePayload {
        loss: curve.loss_values,
        probability: curve.exceedance_probabilities,
        metrics: metrics::compute(losses, probability),
        parameters_used,
    }
}

/// Sample a stage and return the raw losses with the seed actually used.
fn sample_stage(
    scenarios: &[ScenarioParameters],
    num_simulations: usize,
    seed: u64,
    correlation_matrix: Option<&[Vec<f64>]>,
) -> RiskEngineResult<PortfolioLosses> {
    validate_num_simulations(num_simulations)?;
    sample_portfolio(scenarios, num_simulations, seed, correlation_matrix)
}

// ---------------------------------------------------------------------------
// Public API: scenario and portfolio simulation
// ---------------------------------------------------------------------------

/// Simulate every scenario of a stage, then build each scenario's curve and
/// metrics plus the `Portfolio_Total` entry.
pub fn run_risk_simulation(
    input: &RiskSimulationInput,
) -> RiskEngineResult<ComputationOutput<RiskSimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.max_curve_points < 2 {
        return Err(RiskEngineError::invalid(
            "max_curve_points",
            format!("Must be at least 2, got {}", input.max_curve_points),
        ));
    }

    let seed = input.seed.unwrap_or_else(|| input.stage.default_seed());
    let n = input.num_simulations;
    let mode = if input.correlation_matrix.is_some() {
        SamplingMode::Correlated
    } else {
        SamplingMode::Independent
    };

    let losses = sample_stage(&input.scenarios, n, seed, input.correlation_matrix.as_deref())?;

    let mut results = BTreeMap::new();
    if !losses.is_empty() {
        for scenario in &input.scenarios {
            let sample = &losses[&scenario.name];
            let fitted = fit_ci90(scenario.lower_bound, scenario.upper_bound)?;
            let entry = payload(
                sample,
                Some(scenario.probability),
                input.max_curve_points,
                ParametersUsed::Scenario {
                    scenario: scenario.clone(),
                    fitted,
                    seed,
                    num_simulations: n,
                },
            );
            if entry.metrics.is_none() {
                tracing::warn!(scenario = %scenario.name, "scenario produced no losses");
                warnings.push(format!(
                    "Scenario '{}' produced no losses in {n} iterations",
                    scenario.name
                ));
            }
            results.insert(scenario.name.clone(), entry);
        }

        let total = payload(
            &losses[PORTFOLIO_TOTAL],
            None,
            input.max_curve_points,
            ParametersUsed::Portfolio {
                scenario_count: input.scenarios.len(),
                mode,
                seed,
                num_simulations: n,
            },
        );
        results.insert(PORTFOLIO_TOTAL.to_string(), total);
    }

    let output = RiskSimulationOutput {
        stage: input.stage,
        seed,
        num_simulations: n,
        mode,
        results,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-stage frequency/severity Monte Carlo with lognormal CI90 severities",
        &serde_json::json!({
            "num_simulations": n,
            "seed": seed,
            "stage": input.stage,
            "mode": mode,
            "scenarios": input.scenarios.iter().map(|s| &s.name).collect::<Vec<_>>(),
            "max_curve_points": input.max_curve_points,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Public API: risk tolerance
// ---------------------------------------------------------------------------

#[cfg(feature = "tolerance")]
pub use tolerance_api::*;

#[cfg(feature = "tolerance")]
mod tolerance_api {
    use super::*;
    use crate::tolerance::curve::{fit_and_render, RiskToleranceCurve, DEFAULT_POINTS};
    use crate::types::TolerancePoint;

    fn default_num_points() -> usize {
        DEFAULT_POINTS
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RiskToleranceInput {
        pub points: [TolerancePoint; 2],
        #[serde(default = "default_num_points")]
        pub num_points: usize,
    }

    /// Fit and render the organisation's risk-tolerance curve.
    pub fn run_risk_tolerance_curve(
        input: &RiskToleranceInput,
    ) -> RiskEngineResult<ComputationOutput<RiskToleranceCurve>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let [p1, p2] = &input.points;
        let curve = fit_and_render(p1, p2, input.num_points)?;
        if curve.upper_clamped {
            warnings.push(format!(
                "Upper exceedance probability capped at {}",
                curve.probability_range.0
            ));
        }

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Two-point lognormal risk tolerance fit",
            &serde_json::json!({
                "points": input.points,
                "num_points": input.num_points,
            }),
            warnings,
            elapsed,
            curve,
        ))
    }
}

// ---------------------------------------------------------------------------
// Public API: treatment ROI
// ---------------------------------------------------------------------------

#[cfg(feature = "treatment")]
pub use treatment_api::*;

#[cfg(feature = "treatment")]
mod treatment_api {
    use super::*;
    use crate::treatment::roi::{annual_loss_expectancy, roi, RoiOutcome};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TreatmentAnalysisInput {
        /// Scenarios with existing controls.
        pub current: Vec<ScenarioParameters>,
        /// The same risks after the proposed treatment.
        pub residual: Vec<ScenarioParameters>,
        pub treatment_cost: f64,
        #[serde(default = "default_num_simulations")]
        pub num_simulations: usize,
        #[serde(default)]
        pub current_seed: Option<u64>,
        #[serde(default)]
        pub residual_seed: Option<u64>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TreatmentAnalysisOutput {
        pub current_ale: f64,
        pub residual_ale: f64,
        pub risk_reduction: f64,
        pub treatment_cost: f64,
        pub roi: RoiOutcome,
        pub current_seed: u64,
        pub residual_seed: u64,
    }

    fn stage_ale(
        scenarios: &[ScenarioParameters],
        num_simulations: usize,
        seed: u64,
    ) -> RiskEngineResult<f64> {
        let losses = sample_stage(scenarios, num_simulations, seed, None)?;
        let metrics = losses
            .get(PORTFOLIO_TOTAL)
            .and_then(|total| metrics::compute(total, None));
        Ok(annual_loss_expectancy(metrics.as_ref()))
    }

    /// Simulate the current and residual stages and derive the treatment's
    /// return on investment from their portfolio ALEs.
    pub fn run_treatment_analysis(
        input: &TreatmentAnalysisInput,
    ) -> RiskEngineResult<ComputationOutput<TreatmentAnalysisOutput>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let current_seed = input
            .current_seed
            .unwrap_or_else(|| RiskStage::Current.default_seed());
        let residual_seed = input
            .residual_seed
            .unwrap_or_else(|| RiskStage::Residual.default_seed());

        let current_ale = stage_ale(&input.current, input.num_simulations, current_seed)?;
        let residual_ale = stage_ale(&input.residual, input.num_simulations, residual_seed)?;
        let outcome = roi(current_ale, residual_ale, input.treatment_cost);
        if let RoiOutcome::NotApplicable { reason } = &outcome {
            warnings.push(format!("ROI not applicable: {reason}"));
        }

        let output = TreatmentAnalysisOutput {
            current_ale,
            residual_ale,
            risk_reduction: current_ale - residual_ale,
            treatment_cost: input.treatment_cost,
            roi: outcome,
            current_seed,
            residual_seed,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Return on control investment from simulated current/residual ALE",
            &serde_json::json!({
                "num_simulations": input.num_simulations,
                "current_seed": current_seed,
                "residual_seed": residual_seed,
                "current_scenarios": input.current.len(),
                "residual_scenarios": input.residual.len(),
            }),
            warnings,
            elapsed,
            output,
        ))
    }
}

// ---------------------------------------------------------------------------
// Public API: curve aggregation fallback
// ---------------------------------------------------------------------------

fn default_axis_points() -> usize {
    crate::analytics::aggregation::AXIS_POINTS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveAggregationInput {
    pub curves: Vec<ExceedanceCurve>,
    #[serde(default = "default_axis_points")]
    pub axis_points: usize,
}

/// Combine stored curves under an independence assumption.
pub fn run_curve_aggregation(
    input: &CurveAggregationInput,
) -> RiskEngineResult<ComputationOutput<ExceedanceCurve>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (i, c) in input.curves.iter().enumerate() {
        c.validate(&format!("curves[{i}]"))?;
    }
    if input.curves.len() > 1 {
        warnings.push("Curves combined assuming independent scenario losses".into());
    }

    let combined =
        crate::analytics::aggregation::sum_curves_with(&input.curves, input.axis_points);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Survival-probability product over a shared log loss axis",
        &serde_json::json!({
            "curve_count": input.curves.len(),
            "axis_points": input.axis_points,
        }),
        warnings,
        elapsed,
        combined,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn scenario(name: &str, p: f64, lb: f64, ub: f64) -> ScenarioParameters {
        ScenarioParameters::lognormal_ci90(name, p, lb, ub).unwrap()
    }

    fn basic_input() -> RiskSimulationInput {
        RiskSimulationInput {
            scenarios: vec![
                scenario("breach", 0.1, 10_000.0, 1_000_000.0),
                scenario("fraud", 0.3, 1_000.0, 100_000.0),
            ],
            num_simulations: 10_000,
            seed: Some(SEED),
            stage: RiskStage::Current,
            correlation_matrix: None,
            max_curve_points: 500,
        }
    }

    #[test]
    fn test_simulation_runs() {
        let out = run_risk_simulation(&basic_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.results.len(), 3);
        assert_eq!(r.seed, SEED);
        assert_eq!(r.mode, SamplingMode::Independent);
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }

    #[test]
    fn test_payload_shapes() {
        let out = run_risk_simulation(&basic_input()).unwrap();
        for (name, entry) in &out.result.results {
            assert_eq!(entry.loss.len(), entry.probability.len(), "{name}");
            assert!(entry.loss.len() <= 501, "{name}: {}", entry.loss.len());
            assert!(entry.metrics.is_some(), "{name}");
        }
        let breach = &out.result.results["breach"];
        assert_eq!(
            breach.metrics.as_ref().unwrap().probability_lookups.len(),
            4
        );
        let total = &out.result.results[PORTFOLIO_TOTAL];
        assert!(total.metrics.as_ref().unwrap().probability_lookups.is_empty());
    }

    #[test]
    fn test_total_mean_is_sum_of_means() {
        let out = run_risk_simulation(&basic_input()).unwrap();
        let mean = |k: &str| out.result.results[k].metrics.as_ref().unwrap().mean;
        let sum = mean("breach") + mean("fraud");
        assert!((mean(PORTFOLIO_TOTAL) - sum).abs() / sum < 1e-9);
    }

    #[test]
    fn test_stage_default_seed() {
        let mut input = basic_input();
        input.seed = None;
        input.stage = RiskStage::Residual;
        let out = run_risk_simulation(&input).unwrap();
        assert_eq!(out.result.seed, RiskStage::Residual.default_seed());
    }

    #[test]
    fn test_empty_scenarios() {
        let mut input = basic_input();
        input.scenarios.clear();
        let out = run_risk_simulation(&input).unwrap();
        assert!(out.result.results.is_empty());
    }

    #[test]
    fn test_min_simulations_validation() {
        let mut input = basic_input();
        input.num_simulations = 50;
        assert!(run_risk_simulation(&input).is_err());
    }

    #[test]
    fn test_correlated_mode_reported() {
        let mut input = basic_input();
        input.correlation_matrix = Some(vec![vec![1.0, 0.4], vec![0.4, 1.0]]);
        let out = run_risk_simulation(&input).unwrap();
        assert_eq!(out.result.mode, SamplingMode::Correlated);
        match &out.result.results[PORTFOLIO_TOTAL].parameters_used {
            ParametersUsed::Portfolio { mode, .. } => assert_eq!(*mode, SamplingMode::Correlated),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rare_scenario_warns() {
        let mut input = basic_input();
        input.num_simulations = 100;
        input.scenarios.push(scenario("meteor", 1e-9, 1.0, 2.0));
        let out = run_risk_simulation(&input).unwrap();
        assert!(out.result.results["meteor"].metrics.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("meteor")));
        let json = serde_json::to_value(&out.result.results["meteor"]).unwrap();
        assert_eq!(json["metrics"], serde_json::json!({}));
    }

    #[test]
    fn test_payload_json_shape() {
        let out = run_risk_simulation(&basic_input()).unwrap();
        let json = serde_json::to_value(&out).unwrap();
        let breach = &json["result"]["results"]["breach"];
        assert!(breach["loss"].is_array());
        assert!(breach["probability"].is_array());
        assert_eq!(
            breach["parameters_used"]["scenario"]["impact"]["distribution"],
            "LOGNORMAL-CI90"
        );
        assert!(json["result"]["results"][PORTFOLIO_TOTAL]["parameters_used"]["scenario_count"]
            .is_number());
    }

    #[test]
    fn test_input_defaults_from_json() {
        let input: RiskSimulationInput = serde_json::from_value(serde_json::json!({
            "scenarios": [{
                "name": "breach",
                "probability": 0.1,
                "impact": { "lb": 10000.0, "ub": 1000000.0, "distribution": "LOGNORMAL-CI90" }
            }]
        }))
        .unwrap();
        assert_eq!(input.num_simulations, 100_000);
        assert_eq!(input.max_curve_points, DEFAULT_MAX_POINTS);
        assert_eq!(input.stage, RiskStage::Current);
        assert!(input.seed.is_none());
    }

    #[cfg(feature = "tolerance")]
    #[test]
    fn test_tolerance_entry_point() {
        use crate::types::TolerancePoint;
        let input = RiskToleranceInput {
            points: [
                TolerancePoint { probability: 0.5, acceptable_loss: 10_000.0 },
                TolerancePoint { probability: 0.01, acceptable_loss: 2_000_000.0 },
            ],
            num_points: 100,
        };
        let out = run_risk_tolerance_curve(&input).unwrap();
        assert_eq!(out.result.curve.len(), 100);
    }

    #[cfg(feature = "treatment")]
    #[test]
    fn test_treatment_roi() {
        let input = TreatmentAnalysisInput {
            current: vec![scenario("breach", 0.3, 10_000.0, 1_000_000.0)],
            residual: vec![scenario("breach", 0.1, 10_000.0, 1_000_000.0)],
            treatment_cost: 10_000.0,
            num_simulations: 20_000,
            current_seed: None,
            residual_seed: None,
        };
        let out = run_treatment_analysis(&input).unwrap();
        let r = &out.result;
        assert!(r.current_ale > r.residual_ale);
        assert!(r.roi.is_applicable());
        assert_eq!(r.current_seed, 42);
        assert_eq!(r.residual_seed, 43);
    }

    #[cfg(feature = "treatment")]
    #[test]
    fn test_treatment_zero_cost() {
        let input = TreatmentAnalysisInput {
            current: vec![scenario("breach", 0.3, 10_000.0, 1_000_000.0)],
            residual: vec![],
            treatment_cost: 0.0,
            num_simulations: 1_000,
            current_seed: Some(1),
            residual_seed: Some(2),
        };
        let out = run_treatment_analysis(&input).unwrap();
        assert_eq!(out.result.residual_ale, 0.0);
        assert!(!out.result.roi.is_applicable());
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_curve_aggregation_entry_point() {
        let a = ExceedanceCurve::build(&[0.0, 10.0, 100.0]);
        let b = ExceedanceCurve::build(&[0.0, 20.0, 200.0]);
        let out = run_curve_aggregation(&CurveAggregationInput {
            curves: vec![a, b],
            axis_points: 50,
        })
        .unwrap();
        assert!(!out.result.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_curve_aggregation_rejects_ragged_curve() {
        let bad = ExceedanceCurve {
            loss_values: vec![1.0, 2.0],
            exceedance_probabilities: vec![1.0],
        };
        let input = CurveAggregationInput {
            curves: vec![bad],
            axis_points: 10,
        };
        assert!(run_curve_aggregation(&input).is_err());
    }

    #[test]
    fn test_curve_aggregation_rejects_unsorted_curve() {
        let unsorted = ExceedanceCurve {
            loss_values: vec![100.0, 10.0, 1_000.0],
            exceedance_probabilities: vec![0.5, 0.9, 0.1],
        };
        let input = CurveAggregationInput {
            curves: vec![ExceedanceCurve::build(&[0.0, 50.0, 500.0]), unsorted],
            axis_points: 100,
        };
        match run_curve_aggregation(&input) {
            Err(RiskEngineError::InvalidParameters { field, .. }) => {
                assert!(field.starts_with("curves[1]"), "{field}");
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }
}
