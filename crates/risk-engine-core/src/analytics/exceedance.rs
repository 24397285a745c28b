use serde::{Deserialize, Serialize};

use crate::error::RiskEngineError;
use crate::RiskEngineResult;

/// Default cap on points kept for storage and transport.
pub const DEFAULT_MAX_POINTS: usize = 1_000;

/// Loss exceedance curve: `exceedance_probabilities[i]` is the fraction of
/// iterations whose loss is at least `loss_values[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceedanceCurve {
    /// Ascending.
    pub loss_values: Vec<f64>,
    /// Descending, in [0, 1].
    pub exceedance_probabilities: Vec<f64>,
}

impl ExceedanceCurve {
    /// Sort the sample and assign `1 − i/n` to the i-th smallest loss.
    pub fn build(losses: &[f64]) -> Self {
        let mut sorted = losses.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len() as f64;
        let exceedance_probabilities = (0..sorted.len()).map(|i| 1.0 - i as f64 / n).collect();
        ExceedanceCurve {
            loss_values: sorted,
            exceedance_probabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.loss_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss_values.is_empty()
    }

    /// Check a caller-supplied curve: equal lengths, finite non-negative
    /// non-decreasing losses, probabilities in [0, 1] and non-increasing.
    /// `field` names the curve in the error.
    pub fn validate(&self, field: &str) -> RiskEngineResult<()> {
        let loss = &self.loss_values;
        let prob = &self.exceedance_probabilities;
        if loss.len() != prob.len() {
            return Err(RiskEngineError::invalid(
                field,
                "loss_values and exceedance_probabilities differ in length",
            ));
        }
        if let Some(i) = loss.iter().position(|l| !l.is_finite() || *l < 0.0) {
            return Err(RiskEngineError::invalid(
                format!("{field}.loss_values[{i}]"),
                format!("Must be finite and non-negative, got {}", loss[i]),
            ));
        }
        if let Some(i) = loss.windows(2).position(|w| w[1] < w[0]) {
            return Err(RiskEngineError::invalid(
                format!("{field}.loss_values[{}]", i + 1),
                "Must be non-decreasing",
            ));
        }
        if let Some(i) = prob.iter().position(|p| !(0.0..=1.0).contains(p)) {
            return Err(RiskEngineError::invalid(
                format!("{field}.exceedance_probabilities[{i}]"),
                format!("Must be in [0, 1], got {}", prob[i]),
            ));
        }
        if let Some(i) = prob.windows(2).position(|w| w[1] > w[0]) {
            return Err(RiskEngineError::invalid(
                format!("{field}.exceedance_probabilities[{}]", i + 1),
                "Must be non-increasing",
            ));
        }
        Ok(())
    }

    /// Keep every k-th point, `k = max(1, n / max_points)`. The final point
    /// is always retained so the curve still reaches its `1/n` tail.
    ///
    /// Only for bounding payload size; metrics must use the full sample.
    pub fn downsample(&self, max_points: usize) -> Self {
        let n = self.len();
        if n == 0 {
            return self.clone();
        }
        let k = (n / max_points.max(1)).max(1);
        let mut indices: Vec<usize> = (0..n).step_by(k).collect();
        if indices.last() != Some(&(n - 1)) {
            indices.push(n - 1);
        }
        ExceedanceCurve {
            loss_values: indices.iter().map(|&i| self.loss_values[i]).collect(),
            exceedance_probabilities: indices
                .iter()
                .map(|&i| self.exceedance_probabilities[i])
                .collect(),
        }
    }

    /// Loss reached with exceedance probability `target`, interpolating in
    /// probability space over the reversed curve. Returns 0 when the curve
    /// never reaches `target`.
    pub fn loss_at_exceedance(&self, target: f64) -> f64 {
        match self.exceedance_probabilities.first() {
            Some(&max_exceedance) if max_exceedance >= target => {}
            _ => return 0.0,
        }
        let xp: Vec<f64> = self.exceedance_probabilities.iter().rev().copied().collect();
        let fp: Vec<f64> = self.loss_values.iter().rev().copied().collect();
        interp(target, &xp, &fp, fp[0], fp[fp.len() - 1])
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`. `xp` must be
/// non-decreasing; `left`/`right` are returned outside its range. On ties
/// the first matching point wins.
pub fn interp(x: f64, xp: &[f64], fp: &[f64], left: f64, right: f64) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    if xp.is_empty() {
        return left;
    }
    let j = xp.partition_point(|&v| v < x);
    if j == xp.len() {
        return right;
    }
    if xp[j] == x {
        return fp[j];
    }
    if j == 0 {
        return left;
    }
    let (x0, x1) = (xp[j - 1], xp[j]);
    let (y0, y1) = (fp[j - 1], fp[j]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
