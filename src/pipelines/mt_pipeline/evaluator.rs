use crate::core::EvalError;
use crate::data::DataLoader;
use crate::models::Seq2SeqModel;
use crate::pipelines::utils::{generate_batches, save_predictions, step_dir, DecodeSettings, GenerationPass};
use crate::pipelines::{EvalReport, Evaluator};
use crate::scoring::mean_sentence_bleu;
use crate::tokenizer::Seq2SeqTokenizer;
use std::path::PathBuf;
use tracing::info;

/// Translates from several source languages into English and reports the
/// mean sentence BLEU.
pub struct MtEvaluator<M, T, D> {
    pub(crate) model: M,
    pub(crate) tokenizer: T,
    /// Source language and its dataloader, evaluated in this order.
    pub(crate) dataloaders: Vec<(String, D)>,
    pub(crate) tgt_lang: &'static str,
    pub(crate) pred_save_dir: PathBuf,
    pub(crate) decode: DecodeSettings,
    pub(crate) n_step: Option<u64>,
}

impl<M, T, D> MtEvaluator<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    /// mBART code of the target language, e.g. `en_XX`.
    pub fn tgt_lang(&self) -> &str {
        self.tgt_lang
    }

    pub fn source_languages(&self) -> impl Iterator<Item = &str> {
        self.dataloaders.iter().map(|(lang, _)| lang.as_str())
    }

    /// `step_{n}/{tgt2}-{src}.{tgt}`, e.g. `step_3/en-de.en_XX`.
    pub fn prediction_path(&self, src_lang: &str) -> PathBuf {
        let short = self.tgt_lang.get(..2).unwrap_or(self.tgt_lang);
        step_dir(&self.pred_save_dir, self.n_step)
            .join(format!("{short}-{src_lang}.{}", self.tgt_lang))
    }

    pub fn eval_translation(&self, src_lang: &str, dataloader: &D) -> anyhow::Result<f64> {
        let (translations, targets) = self.gen_translations_n_targets(src_lang, dataloader)?;
        Ok(Self::get_bleu(&translations, &targets))
    }

    /// Mean of per-sentence BLEU, not corpus BLEU.
    pub fn get_bleu(preds: &[String], targets: &[String]) -> f64 {
        mean_sentence_bleu(preds, targets)
    }

    /// Predicted translations and decoded gold labels; predictions are saved.
    pub fn gen_translations_n_targets(
        &self,
        src_lang: &str,
        dataloader: &D,
    ) -> anyhow::Result<(Vec<String>, Vec<String>)> {
        let options = self.decode.options(self.tokenizer.token_id(self.tgt_lang)?);
        let generated = generate_batches(
            &self.model,
            &self.tokenizer,
            dataloader,
            &options,
            GenerationPass {
                with_loss: false,
                with_references: true,
            },
        )?;

        save_predictions(&generated.predictions, &self.prediction_path(src_lang))?;
        Ok((generated.predictions, generated.references))
    }
}

impl<M, T, D> Evaluator for MtEvaluator<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    fn run_eval(&mut self, n_step: Option<u64>) -> anyhow::Result<EvalReport> {
        self.n_step = n_step;
        if self.dataloaders.is_empty() {
            return Err(EvalError::NoLanguages.into());
        }

        let mut scores = Vec::with_capacity(self.dataloaders.len());
        for (src_lang, dataloader) in &self.dataloaders {
            let bleu = self.eval_translation(src_lang, dataloader)?;
            info!(
                "bleu score for {}->{}: {:.4}",
                src_lang,
                self.tgt_lang.get(..2).unwrap_or(self.tgt_lang),
                bleu
            );
            scores.push(bleu);
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Ok(EvalReport::scored(None, mean))
    }
}
