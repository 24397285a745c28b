use serde::{Deserialize, Serialize};

use crate::analytics::exceedance::ExceedanceCurve;

/// Version of the metrics contract emitted by [`compute_with`].
pub const METRICS_CONTRACT_VERSION: u32 = 2;

/// Absolute loss thresholds for tail probabilities (currency-agnostic).
pub const LOSS_THRESHOLDS: [f64; 3] = [10_000.0, 100_000.0, 1_000_000.0];

/// Divisors applied to a scenario's annual probability for the
/// probability-indexed loss lookups.
pub const PROBABILITY_DIVISORS: [u32; 4] = [2, 4, 8, 16];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Optional metric groups computed on top of the core statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricsExtras {
    #[default]
    None,
    /// Loss read off the curve at `probability / d` for each divisor `d`.
    ProbabilityIndexed { probability: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdExceedance {
    pub threshold: f64,
    /// Fraction of iterations with loss strictly above `threshold`.
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityLookup {
    pub divisor: u32,
    pub exceedance_probability: f64,
    pub loss: f64,
}

/// Summary statistics of a loss sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub contract_version: u32,
    pub num_simulations: usize,
    /// Annual loss expectancy.
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub var_999: f64,
    /// Mean of all losses at or above `var_99`.
    pub expected_shortfall_99: f64,
    pub max_loss: f64,
    pub prob_zero_loss: f64,
    pub threshold_exceedance: Vec<ThresholdExceedance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probability_lookups: Vec<ProbabilityLookup>,
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Compute the percentile value from a **sorted** slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Risk metrics for `losses`; `probability` (the scenario's own annual
/// probability) switches on the probability-indexed lookups.
///
/// Returns `None` when the sample is empty or contains only zero losses.
pub fn compute(losses: &[f64], probability: Option<f64>) -> Option<RiskMetrics> {
    let extras = match probability {
        Some(probability) => MetricsExtras::ProbabilityIndexed { probability },
        None => MetricsExtras::None,
    };
    compute_with(losses, extras)
}

pub fn compute_with(losses: &[f64], extras: MetricsExtras) -> Option<RiskMetrics> {
    if losses.iter().all(|&l| l == 0.0) {
        return None;
    }

    let curve = ExceedanceCurve::build(losses);
    let sorted = &curve.loss_values;
    let n = sorted.len() as f64;

    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let var_99 = percentile_sorted(sorted, 99.0);
    let tail: Vec<f64> = sorted.iter().copied().filter(|&l| l >= var_99).collect();
    let expected_shortfall_99 = tail.iter().sum::<f64>() / tail.len() as f64;

    let prob_zero_loss = sorted.iter().filter(|&&l| l == 0.0).count() as f64 / n;
    let threshold_exceedance = LOSS_THRESHOLDS
        .iter()
        .map(|&threshold| ThresholdExceedance {
            threshold,
            probability: sorted.iter().filter(|&&l| l > threshold).count() as f64 / n,
        })
        .collect();

    let probability_lookups = match extras {
        MetricsExtras::ProbabilityIndexed { probability }
            if probability.is_finite() && probability > 0.0 =>
        {
            PROBABILITY_DIVISORS
                .iter()
                .map(|&divisor| {
                    let target = probability / divisor as f64;
                    ProbabilityLookup {
                        divisor,
                        exceedance_probability: target,
                        loss: curve.loss_at_exceedance(target),
                    }
                })
                .collect()
        }
        _ => Vec::new(),
    };

    Some(RiskMetrics {
        contract_version: METRICS_CONTRACT_VERSION,
        num_simulations: sorted.len(),
        mean,
        median: percentile_sorted(sorted, 50.0),
        std_dev: variance.sqrt(),
        var_95: percentile_sorted(sorted, 95.0),
        var_99,
        var_999: percentile_sorted(sorted, 99.9),
        expected_shortfall_99,
        max_loss: sorted[sorted.len() - 1],
        prob_zero_loss,
        threshold_exceedance,
        probability_lookups,
    })
}

/// Serde adapter writing `None` as `{}` so callers always receive a mapping.
pub mod empty_when_none {
    use super::RiskMetrics;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        metrics: &Option<RiskMetrics>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match metrics {
            Some(m) => m.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RiskMetrics>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
