use super::postprocess::{restored_path, AmrPostprocessor};
use crate::core::ScoreError;
use crate::data::parallel::read_lines;
use crate::data::DataLoader;
use crate::models::{GenerateOptions, Seq2SeqModel};
use crate::pipelines::utils::{
    generate_batches, mean_loss, save_predictions, step_dir, DecodeSettings, GenerationPass,
};
use crate::pipelines::{EvalReport, Evaluator, ScoreStatus};
use crate::scoring::GraphScorer;
use crate::tokenizer::Seq2SeqTokenizer;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub(crate) const AMR_START_TOKEN: &str = "amr";
pub(crate) const AMR_BOS_TOKEN: &str = "(";

/// Generates AMR graphs and scores them with smatch.
pub struct AmrEvaluator<M, T, D> {
    pub(crate) model: M,
    pub(crate) tokenizer: T,
    pub(crate) dataloader: D,
    pub(crate) gold_file: PathBuf,
    pub(crate) sent_path: PathBuf,
    pub(crate) pred_save_dir: PathBuf,
    pub(crate) src_lang: String,
    pub(crate) decode: DecodeSettings,
    /// `(word-initial vocab, padded subtoken vocab)` used when `src_lang` is `zh`.
    pub(crate) chinese_vocab: Option<(PathBuf, PathBuf)>,
    pub(crate) scorer: Box<dyn GraphScorer>,
    pub(crate) postprocessor: Box<dyn AmrPostprocessor>,
    pub(crate) n_step: Option<u64>,
}

impl<M, T, D> AmrEvaluator<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    pub fn src_lang(&self) -> &str {
        &self.src_lang
    }

    pub fn n_step(&self) -> Option<u64> {
        self.n_step
    }

    /// Where `run_eval` writes raw predictions for a step.
    pub fn prediction_path(&self, n_step: Option<u64>) -> PathBuf {
        step_dir(&self.pred_save_dir, n_step)
            .join(&self.src_lang)
            .join("pred.txt.tf")
    }

    /// Token sequences banned during generation: Chinese pieces when the
    /// source is Chinese, nothing otherwise.
    pub fn bad_words_ids(&self) -> anyhow::Result<Option<Vec<Vec<u32>>>> {
        if self.src_lang != "zh" {
            return Ok(None);
        }
        let Some((vocab, vocab_pad)) = &self.chinese_vocab else {
            anyhow::bail!("source language is zh but no Chinese vocabulary files are configured");
        };
        info!("source language is Chinese, applying bad word ids");
        Ok(Some(chinese_bad_words_ids(&self.tokenizer, vocab, vocab_pad)?))
    }

    pub fn generation_options(&self) -> anyhow::Result<GenerateOptions> {
        let mut options = self
            .decode
            .options(self.tokenizer.token_id(AMR_START_TOKEN)?)
            .forced_bos_token_id(self.tokenizer.token_id(AMR_BOS_TOKEN)?);
        if let Some(bad_words) = self.bad_words_ids()? {
            options = options.bad_words_ids(bad_words);
        }
        Ok(options)
    }

    /// Decoded predictions and per-batch losses, in dataloader order.
    pub fn gen_outputs(&self) -> anyhow::Result<(Vec<String>, Vec<f32>)> {
        let options = self.generation_options()?;
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
        Ok((generated.predictions, generated.losses))
    }

    pub fn compute_smatch(&self, pred_path: &Path, ref_path: &Path) -> Result<f64, ScoreError> {
        compute_smatch(self.scorer.as_ref(), pred_path, ref_path)
    }
}

impl<M, T, D> Evaluator for AmrEvaluator<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    fn run_eval(&mut self, n_step: Option<u64>) -> anyhow::Result<EvalReport> {
        self.n_step = n_step;
        let (predictions, losses) = self.gen_outputs()?;

        let pred_file = save_predictions(&predictions, &self.prediction_path(n_step))?;
        let loss = mean_loss(&losses);

        self.postprocessor.process(&pred_file, &self.sent_path)?;

        let report = match self.compute_smatch(&pred_file, &self.gold_file) {
            Ok(smatch) => EvalReport::scored(loss, smatch),
            Err(err @ ScoreError::ExitStatus { .. }) => {
                warn!(error = %err, "smatch failed, reporting 0");
                EvalReport {
                    loss,
                    score: 0.0,
                    status: ScoreStatus::ScorerFailed(err.to_string()),
                }
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            src_lang = %self.src_lang,
            step = ?n_step,
            loss = ?report.loss,
            smatch = report.score,
            "AMR evaluation finished"
        );
        Ok(report)
    }
}

/// Score `<pred_path>.restore.pruned.coref.all.form` against `ref_path`.
///
/// Fails with [`ScoreError::MissingReference`] before touching the scorer
/// when the reference file is absent.
pub fn compute_smatch<S: GraphScorer + ?Sized>(
    scorer: &S,
    pred_path: &Path,
    ref_path: &Path,
) -> Result<f64, ScoreError> {
    if !ref_path.exists() {
        return Err(ScoreError::MissingReference(ref_path.to_path_buf()));
    }
    scorer.score(ref_path, &restored_path(pred_path))
}

/// Bad-word ids for Chinese sources.
///
/// Each word-initial piece (e.g. `▁了`) is banned as its whole id sequence.
/// Each padded subtoken (e.g. `:了`) contributes only its last id, banned as a
/// single token. Empty sequences are dropped.
pub fn chinese_bad_words_ids<T: Seq2SeqTokenizer + ?Sized>(
    tokenizer: &T,
    vocab: &Path,
    vocab_pad: &Path,
) -> anyhow::Result<Vec<Vec<u32>>> {
    let words = read_lines(vocab)?;
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    let word_ids = tokenizer.encode_batch(&words, false)?;

    let padded = read_lines(vocab_pad)?;
    let padded: Vec<&str> = padded.iter().map(String::as_str).collect();
    let subtoken_ids = tokenizer
        .encode_batch(&padded, false)?
        .into_iter()
        .filter_map(|ids| ids.last().map(|&last| vec![last]));

    Ok(word_ids
        .into_iter()
        .chain(subtoken_ids)
        .filter(|ids| !ids.is_empty())
        .collect())
}
