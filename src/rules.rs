pub mod conditions;
pub mod dice;
pub mod evaluator;
