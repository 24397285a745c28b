use serde::{Deserialize, Serialize};

use crate::analytics::exceedance::ExceedanceCurve;
use crate::distribution::{fit_from_points, FittedLognormal};
use crate::error::RiskEngineError;
use crate::types::TolerancePoint;
use crate::RiskEngineResult;

/// Default number of rendered points.
pub const DEFAULT_POINTS: usize = 1_000;

/// The rendered range runs from `min_p * LOWER_WIDENING` to
/// `max_p * UPPER_WIDENING`, capped at [`MAX_RENDER_PROBABILITY`].
const LOWER_WIDENING: f64 = 0.5;
const UPPER_WIDENING: f64 = 1.5;
pub const MAX_RENDER_PROBABILITY: f64 = 0.999;

/// Closed-form summary of the fitted tolerance distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskToleranceCurve {
    pub curve: ExceedanceCurve,
    pub fitted: FittedLognormal,
    pub statistics: ToleranceStatistics,
    /// Highest and lowest rendered exceedance probability.
    pub probability_range: (f64, f64),
    /// True when the upper end of the range hit [`MAX_RENDER_PROBABILITY`].
    pub upper_clamped: bool,
}

/// Fit the organisation's risk-appetite lognormal through two points and
/// render it as an exceedance curve over a log-spaced probability range a
/// little wider than the points themselves.
pub fn fit_and_render(
    point1: &TolerancePoint,
    point2: &TolerancePoint,
    n_points: usize,
) -> RiskEngineResult<RiskToleranceCurve> {
    if n_points < 2 {
        return Err(RiskEngineError::invalid(
            "num_points",
            format!("Must be at least 2, got {n_points}"),
        ));
    }
    let fitted = fit_from_points(point1, point2)?;

    let min_p = point1.probability.min(point2.probability);
    let max_p = point1.probability.max(point2.probability);
    let unclamped_hi = max_p * UPPER_WIDENING;
    let upper_clamped = unclamped_hi > MAX_RENDER_PROBABILITY;
    let hi = unclamped_hi.min(MAX_RENDER_PROBABILITY);
    let lo = min_p * LOWER_WIDENING;

    // Exceedance descends from `hi` to `lo`, so losses ascend.
    let (ln_hi, ln_lo) = (hi.ln(), lo.ln());
    let step = (ln_lo - ln_hi) / (n_points - 1) as f64;
    let exceedance_probabilities: Vec<f64> = (0..n_points)
        .map(|i| (ln_hi + step * i as f64).exp())
        .collect();
    let loss_values = exceedance_probabilities
        .iter()
        .map(|&p| fitted.exceedance_loss(p))
        .collect();

    let statistics = ToleranceStatistics {
        mean: fitted.mean(),
        median: fitted.median(),
        std_dev: fitted.std_dev(),
        p95: fitted.quantile(0.95),
        p99: fitted.quantile(0.99),
    };

    tracing::debug!(mu = fitted.mu, sigma = fitted.sigma, n_points, "fitted tolerance curve");

    Ok(RiskToleranceCurve {
        curve: ExceedanceCurve {
            loss_values,
            exceedance_probabilities,
        },
        fitted,
        statistics,
        probability_range: (hi, lo),
        upper_clamped,
    })
}
