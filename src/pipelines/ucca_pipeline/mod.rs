//! UCCA parsing evaluation.
//!
//! Generated graphs and gold graphs are both delinearized, converted to MRP
//! and written next to each other (`{split}.gold.mrp`, `{split}.pred.mrp`)
//! before mtool compares them. Graphs that cannot be delinearized are
//! replaced by a fixed toy graph and reported as [`Restored::FallbackUsed`](crate::ucca::Restored).

pub mod builder;
pub mod evaluator;

pub use builder::UccaEvaluatorBuilder;
pub use evaluator::UccaEvaluator;
