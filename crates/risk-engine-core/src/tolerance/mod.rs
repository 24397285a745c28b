pub mod curve;

pub use curve::{fit_and_render, RiskToleranceCurve, ToleranceStatistics};
