pub mod aggregation;
pub mod exceedance;
pub mod metrics;

pub use aggregation::sum_curves;
pub use exceedance::ExceedanceCurve;
pub use metrics::{compute, compute_with, MetricsExtras, RiskMetrics};
