use super::evaluator::AmrEvaluator;
use super::postprocess::{AmrPostprocessor, RestoreBrackets};
use crate::core::EvalConfig;
use crate::data::DataLoader;
use crate::models::Seq2SeqModel;
use crate::pipelines::utils::DecodeSettings;
use crate::scoring::{GraphScorer, ScorerEnv, SmatchScorer};
use crate::tokenizer::Seq2SeqTokenizer;
use std::path::PathBuf;

pub struct AmrEvaluatorBuilder<M, T, D> {
    model: M,
    tokenizer: T,
    dataloader: D,
    config: EvalConfig,
    gold_file: Option<PathBuf>,
    sent_path: Option<PathBuf>,
    scorer: Option<Box<dyn GraphScorer>>,
    postprocessor: Option<Box<dyn AmrPostprocessor>>,
}

impl<M, T, D> AmrEvaluatorBuilder<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    pub fn new(model: M, tokenizer: T, dataloader: D) -> Self {
        Self {
            model,
            tokenizer,
            dataloader,
            config: EvalConfig::default(),
            gold_file: None,
            sent_path: None,
            scorer: None,
            postprocessor: None,
        }
    }

    /// Take paths, languages and beam settings from a loaded config.
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Gold AMR file handed to smatch.
    pub fn gold_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.gold_file = Some(path.into());
        self
    }

    /// Source sentences, one per line, used by postprocessing.
    pub fn sent_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sent_path = Some(path.into());
        self
    }

    pub fn pred_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pred_save_dir = dir.into();
        self
    }

    pub fn src_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.src_lang = lang.into();
        self
    }

    /// Beam width; zero is rejected by `build`.
    pub fn num_beams(mut self, num_beams: usize) -> Self {
        self.config.num_beams = num_beams;
        self
    }

    pub fn chinese_vocab(mut self, vocab: impl Into<PathBuf>, vocab_pad: impl Into<PathBuf>) -> Self {
        self.config.chinese_vocab = Some(vocab.into());
        self.config.chinese_vocab_pad = Some(vocab_pad.into());
        self
    }

    /// Replace the smatch subprocess scorer.
    pub fn scorer(mut self, scorer: impl GraphScorer + 'static) -> Self {
        self.scorer = Some(Box::new(scorer));
        self
    }

    pub fn postprocessor(mut self, postprocessor: impl AmrPostprocessor + 'static) -> Self {
        self.postprocessor = Some(Box::new(postprocessor));
        self
    }

    pub fn build(self) -> anyhow::Result<AmrEvaluator<M, T, D>> {
        self.config.validate()?;
        let gold_file = self
            .gold_file
            .ok_or_else(|| anyhow::anyhow!("AMR evaluator needs a gold file"))?;
        let sent_path = self
            .sent_path
            .ok_or_else(|| anyhow::anyhow!("AMR evaluator needs a sentence file"))?;

        let config = self.config;
        let scorer = self.scorer.unwrap_or_else(|| {
            Box::new(
                SmatchScorer::new(config.amr_script_dir.clone())
                    .python(config.python.clone())
                    .env(ScorerEnv::tokenizers_parallelism(config.tokenizers_parallelism)),
            )
        });
        let chinese_vocab = config.chinese_vocab.clone().zip(config.chinese_vocab_pad.clone());

        Ok(AmrEvaluator {
            model: self.model,
            tokenizer: self.tokenizer,
            dataloader: self.dataloader,
            gold_file,
            sent_path,
            pred_save_dir: config.pred_save_dir.clone(),
            src_lang: config.src_lang.clone(),
            decode: DecodeSettings::from_config(&config),
            chinese_vocab,
            scorer,
            postprocessor: self.postprocessor.unwrap_or_else(|| Box::new(RestoreBrackets)),
            n_step: None,
        })
    }
}
