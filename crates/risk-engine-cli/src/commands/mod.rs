pub mod aggregate;
pub mod fit;
pub mod simulate;
pub mod tolerance;
pub mod treatment;
