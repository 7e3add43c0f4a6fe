//! Scorers: external graph scorers behind [`GraphScorer`] and in-process BLEU.

pub mod bleu;
pub mod mtool;
pub mod process;
pub mod smatch;

pub use bleu::{mean_sentence_bleu, sentence_bleu};
pub use mtool::MtoolScorer;
pub use process::{run_scorer, ScorerEnv};
pub use smatch::SmatchScorer;

use crate::core::ScoreError;
use std::path::Path;

/// Scores a prediction file against a gold file.
pub trait GraphScorer {
    fn score(&self, gold: &Path, pred: &Path) -> Result<f64, ScoreError>;

    fn name(&self) -> &str;
}

impl<S: GraphScorer + ?Sized> GraphScorer for Box<S> {
    fn score(&self, gold: &Path, pred: &Path) -> Result<f64, ScoreError> {
        (**self).score(gold, pred)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
