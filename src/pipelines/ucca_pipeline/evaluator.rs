use crate::core::{EvalError, ScoreError};
use crate::data::DataLoader;
use crate::models::Seq2SeqModel;
use crate::pipelines::utils::{
    generate_batches, mean_loss, save_predictions, step_dir, DecodeSettings, GenerationPass,
};
use crate::pipelines::{EvalReport, Evaluator};
use crate::scoring::GraphScorer;
use crate::tokenizer::Seq2SeqTokenizer;
use crate::ucca::{Delinearizer, MrpConverter, MrpGraph, Restored, UccaTree};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub(crate) const UCCA_START_TOKEN: &str = "ucca";
pub(crate) const UCCA_BOS_TOKEN: &str = "[";

/// Generates linearized UCCA graphs and scores them with mtool.
pub struct UccaEvaluator<M, T, D> {
    pub(crate) model: M,
    pub(crate) tokenizer: T,
    pub(crate) dataloader: D,
    pub(crate) gold_graphs: Vec<String>,
    pub(crate) sents: Vec<String>,
    pub(crate) pred_save_dir: PathBuf,
    pub(crate) split: String,
    pub(crate) decode: DecodeSettings,
    pub(crate) toy_tree: UccaTree,
    pub(crate) delinearizer: Box<dyn Delinearizer>,
    pub(crate) converter: Box<dyn MrpConverter>,
    pub(crate) scorer: Box<dyn GraphScorer>,
    pub(crate) n_step: Option<u64>,
}

impl<M, T, D> UccaEvaluator<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    pub fn gold_graphs(&self) -> &[String] {
        &self.gold_graphs
    }

    pub fn sentences(&self) -> &[String] {
        &self.sents
    }

    pub fn gold_mrp_path(&self) -> PathBuf {
        self.pred_save_dir.join(format!("{}.gold.mrp", self.split))
    }

    pub fn pred_mrp_path(&self) -> PathBuf {
        self.pred_save_dir.join(format!("{}.pred.mrp", self.split))
    }

    pub fn raw_prediction_path(&self) -> PathBuf {
        step_dir(&self.pred_save_dir, self.n_step).join("ucca.pred.tf")
    }

    pub fn save_prediction_raw(&self, predictions: &[String]) -> anyhow::Result<PathBuf> {
        save_predictions(predictions, &self.raw_prediction_path())
    }

    /// Decoded predictions and per-batch losses; raw predictions are persisted.
    pub fn gen_outputs(&self) -> anyhow::Result<(Vec<String>, Vec<f32>)> {
        let options = self
            .decode
            .options(self.tokenizer.token_id(UCCA_START_TOKEN)?)
            .forced_bos_token_id(self.tokenizer.token_id(UCCA_BOS_TOKEN)?);

        let generated = generate_batches(
            &self.model,
            &self.tokenizer,
            &self.dataloader,
            &options,
            GenerationPass {
                with_loss: true,
                with_references: false,
            },
        )?;

        self.save_prediction_raw(&generated.predictions)?;
        Ok((generated.predictions, generated.losses))
    }

    /// Delinearize every graph; an unparsable graph becomes the toy tree for
    /// its own index only.
    pub fn delinearize_to_tree<S: AsRef<str>>(&self, graphs: &[S]) -> Vec<Restored> {
        graphs
            .iter()
            .enumerate()
            .map(|(i, graph)| match self.delinearizer.delinearize(graph.as_ref()) {
                Ok(tree) => Restored::Parsed(tree),
                Err(err) => {
                    warn!(index = i, error = %err, "cannot restore UCCA graph, using toy graph");
                    Restored::FallbackUsed {
                        tree: self.toy_tree.clone(),
                        reason: err.to_string(),
                    }
                }
            })
            .collect()
    }

    /// MRP record per tree, tagged with its index.
    pub fn reformat_to_mrp<S: AsRef<str>>(
        &self,
        trees: &[Restored],
        sents: &[S],
    ) -> anyhow::Result<Vec<MrpGraph>> {
        trees
            .iter()
            .zip(sents)
            .enumerate()
            .map(|(i, (restored, sent))| {
                self.converter
                    .convert(restored.tree(), restored.sentence(sent.as_ref()), i)
            })
            .collect()
    }

    pub fn write_mrp(&self, save_to: &Path, data: &[MrpGraph]) -> anyhow::Result<()> {
        crate::ucca::write_mrp(save_to, data)
    }

    pub fn compute_ucca(&self, gold_file: &Path, pred_file: &Path) -> Result<f64, ScoreError> {
        self.scorer.score(gold_file, pred_file)
    }
}

impl<M, T, D> Evaluator for UccaEvaluator<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    fn run_eval(&mut self, n_step: Option<u64>) -> anyhow::Result<EvalReport> {
        self.n_step = n_step;
        let (predictions, losses) = self.gen_outputs()?;
        let loss = mean_loss(&losses);

        if predictions.len() != self.gold_graphs.len() || self.gold_graphs.len() != self.sents.len() {
            return Err(EvalError::Misaligned {
                predictions: predictions.len(),
                graphs: self.gold_graphs.len(),
                sentences: self.sents.len(),
            }
            .into());
        }

        let gold_trees = self.delinearize_to_tree(&self.gold_graphs);
        let pred_trees = self.delinearize_to_tree(&predictions);
        let gold_fallbacks = gold_trees.iter().filter(|t| t.is_fallback()).count();
        let pred_fallbacks = pred_trees.iter().filter(|t| t.is_fallback()).count();

        let gold_mrp = self.reformat_to_mrp(&gold_trees, &self.sents)?;
        let pred_mrp = self.reformat_to_mrp(&pred_trees, &self.sents)?;

        let gold_path = self.gold_mrp_path();
        let pred_path = self.pred_mrp_path();
        self.write_mrp(&gold_path, &gold_mrp)?;
        self.write_mrp(&pred_path, &pred_mrp)?;

        let f1 = self.compute_ucca(&gold_path, &pred_path)?;

        info!(
            split = %self.split,
            step = ?n_step,
            loss = ?loss,
            f1,
            gold_fallbacks,
            pred_fallbacks,
            "UCCA evaluation finished"
        );
        Ok(EvalReport::scored(loss, f1))
    }
}
