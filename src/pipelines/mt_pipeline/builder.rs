use super::evaluator::MtEvaluator;
use crate::core::{EvalConfig, EvalError};
use crate::data::DataLoader;
use crate::models::Seq2SeqModel;
use crate::pipelines::languages::mbart_lang_code;
use crate::pipelines::utils::DecodeSettings;
use crate::tokenizer::Seq2SeqTokenizer;
use std::path::PathBuf;

const TARGET_LANG: &str = "en";

pub struct MtEvaluatorBuilder<M, T, D> {
    model: M,
    tokenizer: T,
    dataloaders: Vec<(String, D)>,
    config: EvalConfig,
}

impl<M, T, D> MtEvaluatorBuilder<M, T, D>
where
    M: Seq2SeqModel,
    T: Seq2SeqTokenizer,
    D: DataLoader,
{
    pub fn new(model: M, tokenizer: T) -> Self {
        Self {
            model,
            tokenizer,
            dataloaders: Vec::new(),
            config: EvalConfig::default(),
        }
    }

    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a source language; languages are evaluated in insertion order and
    /// adding one twice replaces its dataloader.
    pub fn source(mut self, lang: impl Into<String>, dataloader: D) -> Self {
        let lang = lang.into();
        match self.dataloaders.iter_mut().find(|(l, _)| *l == lang) {
            Some(entry) => entry.1 = dataloader,
            None => self.dataloaders.push((lang, dataloader)),
        }
        self
    }

    pub fn pred_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pred_save_dir = dir.into();
        self
    }

    /// Beam width; zero is rejected by `build`.
    pub fn num_beams(mut self, num_beams: usize) -> Self {
        self.config.num_beams = num_beams;
        self
    }

    pub fn build(self) -> anyhow::Result<MtEvaluator<M, T, D>> {
        self.config.validate()?;
        let tgt_lang = mbart_lang_code(TARGET_LANG)
            .ok_or_else(|| EvalError::UnsupportedLanguage(TARGET_LANG.to_string()))?;
        for (lang, _) in &self.dataloaders {
            if mbart_lang_code(lang).is_none() {
                return Err(EvalError::UnsupportedLanguage(lang.clone()).into());
            }
        }

        Ok(MtEvaluator {
            model: self.model,
            tokenizer: self.tokenizer,
            dataloaders: self.dataloaders,
            tgt_lang,
            pred_save_dir: self.config.pred_save_dir.clone(),
            decode: DecodeSettings::from_config(&self.config),
            n_step: None,
        })
    }
}
