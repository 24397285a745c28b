use serde::{Deserialize, Serialize};
use statrs::distribution::LogNormal;
use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;

use crate::error::RiskEngineError;
use crate::types::TolerancePoint;
use crate::RiskEngineResult;

/// Standard-normal quantile at the 95th percentile.
pub const Z95: f64 = 1.644_853_626_951_472_2;
/// Standard-normal quantile at the 5th percentile.
pub const Z05: f64 = -Z95;

// ---------------------------------------------------------------------------
// Standard normal helpers
// ---------------------------------------------------------------------------

/// Φ(x), the standard normal CDF.
pub fn std_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Φ⁻¹(p) for p in (0, 1).
pub fn std_normal_quantile(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lognormal parameters in log space: ln X ~ N(mu, sigma²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedLognormal {
    pub mu: f64,
    pub sigma: f64,
}

impl FittedLognormal {
    /// Value below which a fraction `q` of the distribution lies.
    pub fn quantile(&self, q: f64) -> f64 {
        (self.mu + self.sigma * std_normal_quantile(q)).exp()
    }

    /// Loss exceeded with probability `p`.
    pub fn exceedance_loss(&self, p: f64) -> f64 {
        self.quantile(1.0 - p)
    }

    pub fn mean(&self) -> f64 {
        (self.mu + self.sigma * self.sigma / 2.0).exp()
    }

    pub fn median(&self) -> f64 {
        self.mu.exp()
    }

    pub fn variance(&self) -> f64 {
        let s2 = self.sigma * self.sigma;
        (s2.exp() - 1.0) * (2.0 * self.mu + s2).exp()
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// `statrs` sampler for severity draws.
    pub fn sampler(&self) -> RiskEngineResult<LogNormal> {
        LogNormal::new(self.mu, self.sigma).map_err(|e| {
            RiskEngineError::invalid("distribution", format!("Invalid LogNormal parameters: {e}"))
        })
    }
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

/// Fit a lognormal whose 5th and 95th percentiles are `lower_bound` and
/// `upper_bound`.
pub fn fit_ci90(lower_bound: f64, upper_bound: f64) -> RiskEngineResult<FittedLognormal> {
    if !lower_bound.is_finite() || lower_bound <= 0.0 {
        return Err(RiskEngineError::invalid(
            "lower_bound",
            format!("Must be positive, got {lower_bound}"),
        ));
    }
    if !upper_bound.is_finite() || upper_bound <= lower_bound {
        return Err(RiskEngineError::invalid(
            "upper_bound",
            format!("Must be greater than lower_bound ({lower_bound}), got {upper_bound}"),
        ));
    }

    let sigma = (upper_bound.ln() - lower_bound.ln()) / (Z95 - Z05);
    let mu = lower_bound.ln() - sigma * Z05;
    Ok(FittedLognormal { mu, sigma })
}

/// Fit a lognormal through two (exceedance probability, loss) points, where
/// each point states `P(X > loss) = probability`.
pub fn fit_from_points(
    point1: &TolerancePoint,
    point2: &TolerancePoint,
) -> RiskEngineResult<FittedLognormal> {
    for (i, p) in [point1, point2].iter().enumerate() {
        if !p.probability.is_finite() || p.probability <= 0.0 || p.probability >= 1.0 {
            return Err(RiskEngineError::invalid(
                format!("points[{i}].probability"),
                format!("Must be in (0, 1), got {}", p.probability),
            ));
        }
        if !p.acceptable_loss.is_finite() || p.acceptable_loss <= 0.0 {
            return Err(RiskEngineError::invalid(
                format!("points[{i}].acceptable_loss"),
                format!("Must be positive, got {}", p.acceptable_loss),
            ));
        }
    }

    if (point1.probability - point2.probability).abs() < f64::EPSILON {
        return Err(RiskEngineError::DegenerateToleranceInput(format!(
            "Both points have probability {}",
            point1.probability
        )));
    }
    if (point1.acceptable_loss - point2.acceptable_loss).abs() < f64::EPSILON {
        return Err(RiskEngineError::DegenerateToleranceInput(format!(
            "Both points have acceptable loss {}",
            point1.acceptable_loss
        )));
    }

    let z1 = std_normal_quantile(1.0 - point1.probability);
    let z2 = std_normal_quantile(1.0 - point2.probability);
    let sigma = (point1.acceptable_loss.ln() - point2.acceptable_loss.ln()) / (z1 - z2);
    if sigma <= 0.0 {
        return Err(RiskEngineError::DegenerateToleranceInput(
            "The point with the higher probability must carry the lower loss".into(),
        ));
    }
    let mu = point1.acceptable_loss.ln() - sigma * z1;

    Ok(FittedLognormal { mu, sigma })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
