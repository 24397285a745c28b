use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RiskEngineError;
use crate::RiskEngineResult;

/// One simulated annual loss per Monte Carlo iteration, in iteration order.
pub type LossSample = Vec<f64>;

/// Reserved result key holding the element-wise sum of every scenario.
pub const PORTFOLIO_TOTAL: &str = "Portfolio_Total";

// ---------------------------------------------------------------------------
// Scenario inputs
// ---------------------------------------------------------------------------

/// Severity distribution family for a scenario's impact estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distribution {
    /// Lognormal parameterised by its 5th and 95th percentiles.
    #[default]
    #[serde(rename = "LOGNORMAL-CI90", alias = "LOGNORMAL_CI90")]
    LognormalCi90,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::LognormalCi90 => "LOGNORMAL-CI90",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distribution {
    type Err = RiskEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LOGNORMAL-CI90" | "LOGNORMAL_CI90" => Ok(Distribution::LognormalCi90),
            other => Err(RiskEngineError::invalid(
                "distribution",
                format!("Unsupported distribution '{other}' (expected LOGNORMAL-CI90)"),
            )),
        }
    }
}

/// Validated probability/impact estimate for one risk scenario.
///
/// Serialises in the hypothesis-record shape
/// `{ "name", "probability", "impact": { "lb", "ub", "distribution" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HypothesisRecord", into = "HypothesisRecord")]
pub struct ScenarioParameters {
    pub name: String,
    /// Annual probability that the scenario occurs at least once, in (0, 1].
    pub probability: f64,
    /// 5th percentile of the loss given occurrence.
    pub lower_bound: f64,
    /// 95th percentile of the loss given occurrence.
    pub upper_bound: f64,
    pub distribution: Distribution,
}

impl ScenarioParameters {
    pub fn new(
        name: impl Into<String>,
        probability: f64,
        lower_bound: f64,
        upper_bound: f64,
        distribution: Distribution,
    ) -> RiskEngineResult<Self> {
        let params = ScenarioParameters {
            name: name.into(),
            probability,
            lower_bound,
            upper_bound,
            distribution,
        };
        params.validate()?;
        Ok(params)
    }

    /// Shorthand for the only supported family, `LOGNORMAL-CI90`.
    pub fn lognormal_ci90(
        name: impl Into<String>,
        probability: f64,
        lower_bound: f64,
        upper_bound: f64,
    ) -> RiskEngineResult<Self> {
        Self::new(
            name,
            probability,
            lower_bound,
            upper_bound,
            Distribution::LognormalCi90,
        )
    }

    /// Re-check the invariants. Public fields may have been edited after construction.
    pub fn validate(&self) -> RiskEngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(RiskEngineError::invalid("name", "Scenario name must not be empty"));
        }
        if self.name == PORTFOLIO_TOTAL {
            return Err(RiskEngineError::invalid(
                "name",
                format!("'{PORTFOLIO_TOTAL}' is reserved for the aggregated result"),
            ));
        }
        if !self.probability.is_finite() || self.probability <= 0.0 || self.probability > 1.0 {
            return Err(RiskEngineError::invalid(
                self.field("probability"),
                format!("Must be in (0, 1], got {}", self.probability),
            ));
        }
        if !self.lower_bound.is_finite() || self.lower_bound <= 0.0 {
            return Err(RiskEngineError::invalid(
                self.field("lower_bound"),
                format!("Must be positive, got {}", self.lower_bound),
            ));
        }
        if !self.upper_bound.is_finite() || self.upper_bound <= self.lower_bound {
            return Err(RiskEngineError::invalid(
                self.field("upper_bound"),
                format!(
                    "Must be greater than lower_bound ({}), got {}",
                    self.lower_bound, self.upper_bound
                ),
            ));
        }
        Ok(())
    }

    fn field(&self, attr: &str) -> String {
        format!("scenarios[{}].{attr}", self.name)
    }
}

/// Raw hypothesis record as supplied by the calling layer. Every field is
/// optional so that missing values are reported as validation errors rather
/// than as opaque deserialisation failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HypothesisRecord {
    pub name: String,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub impact: Option<ImpactRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactRecord {
    #[serde(default)]
    pub lb: Option<f64>,
    #[serde(default)]
    pub ub: Option<f64>,
    #[serde(default)]
    pub distribution: Option<String>,
}

impl TryFrom<HypothesisRecord> for ScenarioParameters {
    type Error = RiskEngineError;

    fn try_from(record: HypothesisRecord) -> Result<Self, Self::Error> {
        let name = record.name;
        let missing = |attr: &str| {
            RiskEngineError::invalid(format!("scenarios[{name}].{attr}"), "Missing value")
        };

        let probability = record.probability.ok_or_else(|| missing("probability"))?;
        let impact = record.impact.ok_or_else(|| missing("impact"))?;
        let lower_bound = impact.lb.ok_or_else(|| missing("impact.lb"))?;
        let upper_bound = impact.ub.ok_or_else(|| missing("impact.ub"))?;
        let tag = impact
            .distribution
            .ok_or_else(|| missing("impact.distribution"))?;
        let distribution = tag.parse::<Distribution>().map_err(|_| {
            RiskEngineError::invalid(
                format!("scenarios[{name}].impact.distribution"),
                format!("Unsupported distribution '{tag}' (expected LOGNORMAL-CI90)"),
            )
        })?;

        ScenarioParameters::new(name, probability, lower_bound, upper_bound, distribution)
    }
}

impl From<ScenarioParameters> for HypothesisRecord {
    fn from(p: ScenarioParameters) -> Self {
        HypothesisRecord {
            name: p.name,
            probability: Some(p.probability),
            impact: Some(ImpactRecord {
                lb: Some(p.lower_bound),
                ub: Some(p.upper_bound),
                distribution: Some(p.distribution.as_str().to_string()),
            }),
        }
    }
}

/// Risk stage a scenario set describes. Each stage carries its own default
/// seed so that displayed stages never share a random stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStage {
    Inherent,
    #[default]
    Current,
    Residual,
}

impl RiskStage {
    pub fn default_seed(&self) -> u64 {
        match self {
            RiskStage::Inherent => 41,
            RiskStage::Current => 42,
            RiskStage::Residual => 43,
        }
    }
}

/// One point of an organisation's risk appetite: "we accept a loss of
/// `acceptable_loss` or more with annual probability `probability`".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TolerancePoint {
    pub probability: f64,
    pub acceptable_loss: f64,
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
