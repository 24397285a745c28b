pub mod correlation;
pub mod portfolio;
pub mod scenario;
