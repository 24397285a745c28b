use serde::{Deserialize, Serialize};

use crate::analytics::metrics::RiskMetrics;

/// Return on a control investment. Undefined costs are reported as
/// [`RoiOutcome::NotApplicable`], never as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoiOutcome {
    Applicable { roi: f64 },
    NotApplicable { reason: String },
}

impl RoiOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            RoiOutcome::Applicable { roi } => Some(*roi),
            RoiOutcome::NotApplicable { .. } => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, RoiOutcome::Applicable { .. })
    }
}

/// `((current_ale − residual_ale) − treatment_cost) / treatment_cost`.
pub fn roi(current_ale: f64, residual_ale: f64, treatment_cost: f64) -> RoiOutcome {
    if !treatment_cost.is_finite() || treatment_cost <= 0.0 {
        return RoiOutcome::NotApplicable {
            reason: format!("Treatment cost must be positive, got {treatment_cost}"),
        };
    }
    if !current_ale.is_finite() || !residual_ale.is_finite() {
        return RoiOutcome::NotApplicable {
            reason: "Annual loss expectancy is not finite".into(),
        };
    }
    let risk_reduction = current_ale - residual_ale;
    RoiOutcome::Applicable {
        roi: (risk_reduction - treatment_cost) / treatment_cost,
    }
}

/// ALE of a stage: the sample mean, or zero when the sample produced no
/// losses and therefore no metrics.
pub fn annual_loss_expectancy(metrics: Option<&RiskMetrics>) -> f64 {
    metrics.map_or(0.0, |m| m.mean)
}
