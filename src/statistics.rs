pub mod fairness;
pub mod roller;
