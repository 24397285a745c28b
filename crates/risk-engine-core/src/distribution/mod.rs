pub mod fitting;

pub use fitting::{fit_ci90, fit_from_points, std_normal_cdf, std_normal_quantile, FittedLognormal};
