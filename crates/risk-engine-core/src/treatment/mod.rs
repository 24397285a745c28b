pub mod roi;

pub use roi::{annual_loss_expectancy, roi, RoiOutcome};
