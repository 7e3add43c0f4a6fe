//! Evaluation pipelines, one per task.
//!
//! Every pipeline follows the same shape: dataloader → model loss and beam
//! search → detokenization → task postprocessing → scorer → one number.
//!
//! ## Main Types
//!
//! - [`AmrEvaluator`] - smatch over generated AMR graphs
//! - [`UccaEvaluator`] - mtool UCCA F1 over generated, delinearized graphs
//! - [`MtEvaluator`] - mean sentence BLEU over several source languages
//! - [`EvalReport`] - what a run returns

pub mod amr_pipeline;
pub mod languages;
pub mod mt_pipeline;
pub mod ucca_pipeline;
pub mod utils;

pub use amr_pipeline::{AmrEvaluator, AmrEvaluatorBuilder};
pub use mt_pipeline::{MtEvaluator, MtEvaluatorBuilder};
pub use ucca_pipeline::{UccaEvaluator, UccaEvaluatorBuilder};

/// Whether the score came from the scorer or was substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreStatus {
    Scored,
    /// The scorer failed; the score is a 0.0 placeholder.
    ScorerFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    /// Mean batch loss; `None` for pipelines that do not compute one.
    pub loss: Option<f32>,
    pub score: f64,
    pub status: ScoreStatus,
}

impl EvalReport {
    pub fn scored(loss: Option<f32>, score: f64) -> Self {
        Self {
            loss,
            score,
            status: ScoreStatus::Scored,
        }
    }
}

/// One evaluation run. `n_step` only names the output directory.
pub trait Evaluator {
    fn run_eval(&mut self, n_step: Option<u64>) -> anyhow::Result<EvalReport>;
}
