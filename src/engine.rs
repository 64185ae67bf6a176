//! Rule evaluation engine

pub mod evaluator;

pub use evaluator::RuleEngine;
