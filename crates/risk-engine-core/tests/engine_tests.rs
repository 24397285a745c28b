use pretty_assertions::assert_eq;
use serde_json::json;

use risk_engine_core::engine::{
    run_curve_aggregation, run_risk_simulation, run_risk_tolerance_curve, run_treatment_analysis,
    CurveAggregationInput, RiskSimulationInput, RiskToleranceInput, TreatmentAnalysisInput,
};
use risk_engine_core::treatment::RoiOutcome;
use risk_engine_core::{RiskEngineError, RiskStage, PORTFOLIO_TOTAL};

fn simulation_input(value: serde_json::Value) -> RiskSimulationInput {
    serde_json::from_value(value).unwrap()
}

fn hypothesis(name: &str, probability: f64, lb: f64, ub: f64) -> serde_json::Value {
    json!({
        "name": name,
        "probability": probability,
        "impact": { "lb": lb, "ub": ub, "distribution": "LOGNORMAL-CI90" }
    })
}

// ---------------------------------------------------------------------------
// Simulation entry point
// ---------------------------------------------------------------------------

#[test]
fn test_simulation_from_hypothesis_records() {
    let input = simulation_input(json!({
        "scenarios": [
            hypothesis("ransomware", 0.1, 10_000.0, 1_000_000.0),
            hypothesis("phishing", 0.4, 1_000.0, 50_000.0),
        ],
        "num_simulations": 20_000,
        "stage": "inherent"
    }));
    let out = run_risk_simulation(&input).unwrap();
    let result = &out.result;

    assert_eq!(result.stage, RiskStage::Inherent);
    assert_eq!(result.seed, 41);
    assert_eq!(result.results.len(), 3);
    assert!(result.results.contains_key(PORTFOLIO_TOTAL));

    for payload in result.results.values() {
        assert!(payload.loss.len() <= 1_001);
        assert_eq!(payload.loss.len(), payload.probability.len());
        let metrics = payload.metrics.as_ref().unwrap();
        assert_eq!(metrics.num_simulations, 20_000);
    }
    assert_eq!(out.metadata.precision, "ieee754_f64");
}

#[test]
fn test_simulation_json_shape() {
    let input = simulation_input(json!({
        "scenarios": [hypothesis("fraud", 0.25, 5_000.0, 500_000.0)],
        "num_simulations": 5_000,
        "seed": 7
    }));
    let out = run_risk_simulation(&input).unwrap();
    let value = serde_json::to_value(&out).unwrap();

    let fraud = &value["result"]["results"]["fraud"];
    assert!(fraud["loss"].is_array());
    assert!(fraud["probability"].is_array());
    assert_eq!(fraud["metrics"]["contract_version"], json!(2));
    assert_eq!(fraud["parameters_used"]["seed"], json!(7));
    assert_eq!(fraud["parameters_used"]["scenario"]["impact"]["lb"], json!(5_000.0));
    assert_eq!(
        value["result"]["results"][PORTFOLIO_TOTAL]["parameters_used"]["scenario_count"],
        json!(1)
    );
}

#[test]
fn test_simulation_same_seed_same_output() {
    let input = simulation_input(json!({
        "scenarios": [
            hypothesis("a", 0.2, 1_000.0, 90_000.0),
            hypothesis("b", 0.6, 300.0, 4_000.0),
        ],
        "num_simulations": 10_000,
        "seed": 1234
    }));
    let first = run_risk_simulation(&input).unwrap().result.results;
    let second = run_risk_simulation(&input).unwrap().result.results;
    assert_eq!(first, second);
}

#[test]
fn test_simulation_without_scenarios() {
    let input = simulation_input(json!({ "scenarios": [] }));
    let out = run_risk_simulation(&input).unwrap();
    assert!(out.result.results.is_empty());
}

#[test]
fn test_simulation_bad_record_rejected() {
    let parsed: Result<RiskSimulationInput, _> = serde_json::from_value(json!({
        "scenarios": [{ "name": "x", "probability": 0.2, "impact": { "lb": 10.0 } }]
    }));
    assert!(parsed.is_err());
}

#[test]
fn test_simulation_correlation_dimension_checked() {
    let input = simulation_input(json!({
        "scenarios": [
            hypothesis("a", 0.2, 1_000.0, 90_000.0),
            hypothesis("b", 0.6, 300.0, 4_000.0),
        ],
        "num_simulations": 1_000,
        "correlation_matrix": [[1.0]]
    }));
    let err = run_risk_simulation(&input).unwrap_err();
    assert!(matches!(err, RiskEngineError::InvalidCorrelationMatrix(_)));
}

// ---------------------------------------------------------------------------
// Tolerance, treatment and aggregation entry points
// ---------------------------------------------------------------------------

#[test]
fn test_tolerance_curve_passes_through_points() {
    let input: RiskToleranceInput = serde_json::from_value(json!({
        "points": [
            { "probability": 0.5, "acceptable_loss": 10_000.0 },
            { "probability": 0.01, "acceptable_loss": 1_000_000.0 }
        ],
        "num_points": 200
    }))
    .unwrap();
    let out = run_risk_tolerance_curve(&input).unwrap();
    let fitted = &out.result.fitted;
    assert!((fitted.exceedance_loss(0.5) - 10_000.0).abs() / 10_000.0 < 1e-9);
    assert!((fitted.exceedance_loss(0.01) - 1_000_000.0).abs() / 1_000_000.0 < 1e-9);
    assert_eq!(out.result.curve.len(), 200);
}

#[test]
fn test_tolerance_identical_points_rejected() {
    let input: RiskToleranceInput = serde_json::from_value(json!({
        "points": [
            { "probability": 0.1, "acceptable_loss": 10_000.0 },
            { "probability": 0.1, "acceptable_loss": 10_000.0 }
        ]
    }))
    .unwrap();
    let err = run_risk_tolerance_curve(&input).unwrap_err();
    assert!(matches!(err, RiskEngineError::DegenerateToleranceInput(_)));
}

#[test]
fn test_treatment_roi_positive_for_effective_control() {
    let input: TreatmentAnalysisInput = serde_json::from_value(json!({
        "current": [hypothesis("ransomware", 0.3, 10_000.0, 1_000_000.0)],
        "residual": [hypothesis("ransomware", 0.05, 10_000.0, 1_000_000.0)],
        "treatment_cost": 10_000.0,
        "num_simulations": 50_000
    }))
    .unwrap();
    let out = run_treatment_analysis(&input).unwrap().result;
    assert!(out.current_ale > out.residual_ale);
    assert!(out.roi.value().unwrap() > 0.0);
    assert_eq!((out.current_seed, out.residual_seed), (42, 43));
}

#[test]
fn test_treatment_zero_cost_not_applicable() {
    let input: TreatmentAnalysisInput = serde_json::from_value(json!({
        "current": [hypothesis("ransomware", 0.3, 10_000.0, 1_000_000.0)],
        "residual": [hypothesis("ransomware", 0.1, 10_000.0, 1_000_000.0)],
        "treatment_cost": 0.0,
        "num_simulations": 1_000
    }))
    .unwrap();
    let out = run_treatment_analysis(&input).unwrap();
    assert!(matches!(out.result.roi, RoiOutcome::NotApplicable { .. }));
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_aggregation_of_single_curve_is_identity() {
    let input: CurveAggregationInput = serde_json::from_value(json!({
        "curves": [{
            "loss_values": [0.0, 100.0, 1_000.0],
            "exceedance_probabilities": [1.0, 0.5, 0.1]
        }]
    }))
    .unwrap();
    let out = run_curve_aggregation(&input).unwrap().result;
    assert_eq!(out.loss_values, vec![0.0, 100.0, 1_000.0]);
    assert_eq!(out.exceedance_probabilities, vec![1.0, 0.5, 0.1]);
}
