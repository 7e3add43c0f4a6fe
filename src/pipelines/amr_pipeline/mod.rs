//! AMR parsing evaluation.
//!
//! Generates linearized AMR graphs, repairs them into a graph file and
//! scores that file with smatch.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use seq2seq_eval::pipelines::amr_pipeline::*;
//! use seq2seq_eval::pipelines::Evaluator;
//! # fn run<M, T, D>(model: M, tokenizer: T, loader: D) -> anyhow::Result<()>
//! # where M: seq2seq_eval::models::Seq2SeqModel, T: seq2seq_eval::tokenizer::Seq2SeqTokenizer, D: seq2seq_eval::data::DataLoader {
//! let mut evaluator = AmrEvaluatorBuilder::new(model, tokenizer, loader)
//!     .gold_file("data/amr/dev.txt.graph")
//!     .sent_path("data/amr/dev.txt.sent")
//!     .pred_save_dir("out/amr")
//!     .build()?;
//!
//! let report = evaluator.run_eval(Some(1000))?;
//! println!("loss {:?} smatch {}", report.loss, report.score);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod evaluator;
pub mod postprocess;

pub use builder::AmrEvaluatorBuilder;
pub use evaluator::{chinese_bad_words_ids, compute_smatch, AmrEvaluator};
pub use postprocess::{restored_path, AmrPostprocessor, RestoreBrackets, RESTORED_SUFFIX};
