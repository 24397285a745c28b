use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{LogNormal, Normal};
use std::collections::{BTreeMap, HashSet};

use crate::distribution::{fit_ci90, std_normal_cdf};
use crate::error::RiskEngineError;
use crate::rng::{ChunkRng, RngContext};
use crate::simulation::correlation::CorrelationFactor;
use crate::types::{LossSample, ScenarioParameters, PORTFOLIO_TOTAL};
use crate::RiskEngineResult;

/// Raw per-scenario samples plus [`PORTFOLIO_TOTAL`].
pub type PortfolioLosses = BTreeMap<String, LossSample>;

/// How frequency draws are shared between scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One uniform draw per iteration, compared against every scenario's
    /// own probability.
    Independent,
    /// One multivariate-normal draw per iteration, mapped to uniforms
    /// through Φ.
    Correlated,
}

/// Frequency threshold and severity sampler for one scenario.
struct ScenarioModel {
    probability: f64,
    severity: LogNormal,
}

enum FrequencyDraw {
    Shared,
    Correlated { factor: CorrelationFactor, normal: Normal },
}

/// Simulate every scenario over the same `n_simulations` iterations and
/// form the per-iteration portfolio total.
///
/// All validation (scenario bounds, duplicate names, correlation matrix)
/// happens before the first random draw. An empty scenario list yields an
/// empty map.
pub fn sample_portfolio(
    scenarios: &[ScenarioParameters],
    n_simulations: usize,
    seed: u64,
    correlation_matrix: Option<&[Vec<f64>]>,
) -> RiskEngineResult<PortfolioLosses> {
    sample_portfolio_with(scenarios, n_simulations, &RngContext::new(seed), correlation_matrix)
}

/// [`sample_portfolio`] with an explicit RNG context.
pub fn sample_portfolio_with(
    scenarios: &[ScenarioParameters],
    n_simulations: usize,
    ctx: &RngContext,
    correlation_matrix: Option<&[Vec<f64>]>,
) -> RiskEngineResult<PortfolioLosses> {
    if scenarios.is_empty() {
        return Ok(PortfolioLosses::new());
    }

    let models = build_models(scenarios)?;
    let draw = match correlation_matrix {
        None => FrequencyDraw::Shared,
        Some(matrix) => {
            let factor = CorrelationFactor::new(matrix, scenarios.len())?;
            let normal = Normal::new(0.0, 1.0).map_err(|e| {
                RiskEngineError::InvalidCorrelationMatrix(format!("Normal sampler: {e}"))
            })?;
            FrequencyDraw::Correlated { factor, normal }
        }
    };
    let mode = match draw {
        FrequencyDraw::Shared => SamplingMode::Independent,
        FrequencyDraw::Correlated { .. } => SamplingMode::Correlated,
    };

    tracing::debug!(
        scenarios = scenarios.len(),
        n_simulations,
        seed = ctx.seed(),
        ?mode,
        "sampling portfolio"
    );

    let k = models.len();
    let chunks = ctx.map_chunks(n_simulations, |rng, range| {
        let len = range.len();
        let mut columns = vec![vec![0.0; len]; k];
        let mut total = vec![0.0; len];
        let mut uniforms = vec![0.0; k];
        let mut z = vec![0.0; k];

        for i in 0..len {
            fill_uniforms(&draw, rng, &mut z, &mut uniforms);
            let mut sum = 0.0;
            for (j, model) in models.iter().enumerate() {
                if uniforms[j] < model.probability {
                    let loss = rng.sample(&model.severity);
                    columns[j][i] = loss;
                    sum += loss;
                }
            }
            total[i] = sum;
        }
        (columns, total)
    });

    let mut per_scenario: Vec<LossSample> = (0..k).map(|_| Vec::with_capacity(n_simulations)).collect();
    let mut total = Vec::with_capacity(n_simulations);
    for (columns, chunk_total) in chunks {
        for (dst, src) in per_scenario.iter_mut().zip(columns) {
            dst.extend(src);
        }
        total.extend(chunk_total);
    }

    let mut out: PortfolioLosses = scenarios
        .iter()
        .map(|s| s.name.clone())
        .zip(per_scenario)
        .collect();
    out.insert(PORTFOLIO_TOTAL.to_string(), total);

    tracing::debug!(entries = out.len(), "portfolio sampling complete");
    Ok(out)
}

fn build_models(scenarios: &[ScenarioParameters]) -> RiskEngineResult<Vec<ScenarioModel>> {
    let mut seen = HashSet::with_capacity(scenarios.len());
    scenarios
        .iter()
        .map(|s| {
            s.validate()?;
            if !seen.insert(s.name.as_str()) {
                return Err(RiskEngineError::invalid(
                    format!("scenarios[{}].name", s.name),
                    "Duplicate scenario name",
                ));
            }
            let fitted = fit_ci90(s.lower_bound, s.upper_bound).map_err(|e| match e {
                RiskEngineError::InvalidParameters { field, reason } => {
                    RiskEngineError::invalid(format!("scenarios[{}].{field}", s.name), reason)
                }
                other => other,
            })?;
            Ok(ScenarioModel {
                probability: s.probability,
                severity: fitted.sampler()?,
            })
        })
        .collect()
}

/// Per-iteration frequency uniforms. The shared path writes the same draw
/// into every slot.
fn fill_uniforms(draw: &FrequencyDraw, rng: &mut ChunkRng, z: &mut [f64], uniforms: &mut [f64]) {
    match draw {
        FrequencyDraw::Shared => {
            let u: f64 = rng.gen();
            uniforms.fill(u);
        }
        FrequencyDraw::Correlated { factor, normal } => {
            for zi in z.iter_mut() {
                *zi = rng.sample(normal);
            }
            factor.correlate(z, uniforms);
            for u in uniforms.iter_mut() {
                *u = std_normal_cdf(*u);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
