//! Machine translation evaluation into English.

pub mod builder;
pub mod evaluator;

pub use builder::MtEvaluatorBuilder;
pub use evaluator::MtEvaluator;
