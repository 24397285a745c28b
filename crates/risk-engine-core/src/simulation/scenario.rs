use rand::Rng;

use crate::distribution::fit_ci90;
use crate::error::RiskEngineError;
use crate::rng::RngContext;
use crate::types::{LossSample, ScenarioParameters};
use crate::RiskEngineResult;

/// Simulate `n_simulations` annual losses for a single scenario.
///
/// Each iteration is a Bernoulli frequency trial (`u < probability`) followed,
/// on occurrence, by a lognormal severity draw fitted from the CI90 bounds.
/// Iterations without an event contribute a loss of zero.
pub fn sample_annual_loss(
    probability: f64,
    lower_bound: f64,
    upper_bound: f64,
    n_simulations: usize,
    seed: u64,
) -> RiskEngineResult<LossSample> {
    if !probability.is_finite() || probability <= 0.0 || probability > 1.0 {
        return Err(RiskEngineError::invalid(
            "probability",
            format!("Must be in (0, 1], got {probability}"),
        ));
    }
    let severity = fit_ci90(lower_bound, upper_bound)?.sampler()?;
    let ctx = RngContext::new(seed);

    let chunks = ctx.map_chunks(n_simulations, |rng, range| {
        range
            .map(|_| {
                let u: f64 = rng.gen();
                if u < probability {
                    rng.sample(&severity)
                } else {
                    0.0
                }
            })
            .collect::<Vec<f64>>()
    });

    Ok(chunks.concat())
}

/// [`sample_annual_loss`] for a validated scenario and an explicit RNG context.
pub fn sample_scenario(
    scenario: &ScenarioParameters,
    n_simulations: usize,
    ctx: &RngContext,
) -> RiskEngineResult<LossSample> {
    scenario.validate()?;
    sample_annual_loss(
        scenario.probability,
        scenario.lower_bound,
        scenario.upper_bound,
        n_simulations,
        ctx.seed(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
