//! Evaluation of sequence-to-sequence models on AMR parsing, UCCA parsing and
//! machine translation.
//!
//! Each evaluator runs beam search over a dataloader, turns the generated
//! token ids into task output and scores it: smatch for AMR, mtool F1 for
//! UCCA and mean sentence BLEU for translation.

pub mod core;
pub mod data;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod scoring;
pub mod tokenizer;
pub mod ucca;

// Re-export core types
pub use core::{EvalConfig, EvalError, ScoreError};

pub use data::{Batch, DataLoader};
pub use models::{BeamSearchModel, GenerateOptions, Seq2SeqLm, Seq2SeqModel};
pub use pipelines::{
    AmrEvaluator, AmrEvaluatorBuilder, EvalReport, Evaluator, MtEvaluator, MtEvaluatorBuilder,
    ScoreStatus, UccaEvaluator, UccaEvaluatorBuilder,
};
pub use scoring::GraphScorer;
pub use tokenizer::Seq2SeqTokenizer;
