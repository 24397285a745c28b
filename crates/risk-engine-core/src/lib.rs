pub mod distribution;
pub mod error;
pub mod rng;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "analytics")]
pub mod analytics;

#[cfg(feature = "tolerance")]
pub mod tolerance;

#[cfg(feature = "treatment")]
pub mod treatment;

#[cfg(all(feature = "simulation", feature = "analytics"))]
pub mod engine;

pub use error::RiskEngineError;
pub use types::*;

/// Standard result type for all risk-engine operations
pub type RiskEngineResult<T> = Result<T, RiskEngineError>;
