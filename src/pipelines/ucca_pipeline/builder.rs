use super::evaluator::UccaEvaluator;
use crate::core::EvalConfig;
use crate::data::parallel::read_lines;
use crate::data::DataLoader;
use crate::models::Seq2SeqModel;
use crate::pipelines::utils::DecodeSettings;
use crate::scoring::{GraphScorer, MtoolScorer, ScorerEnv};
use crate::tokenizer::Seq2SeqTokenizer;
use crate::ucca::{
    BracketDelinearizer, Delinearizer, MrpConverter, UccaMrpConverter, TOY_GRAPH,
};
use anyhow::Context;
use std::path::PathBuf;

pub struct UccaEvaluatorBuilder<M, T, D> {
    model: M,
    tokenizer: T,
    dataloader: D,
    config: EvalConfig,
    gold_file: Option<PathBuf>,
    sent_path: Option<PathBuf>,
    scorer: Option<Box<dyn GraphScorer>>,
    delinearizer: Option<Box<dyn Delinearizer>>,
    converter: Option<Box<dyn MrpConverter>>,
}

impl<M, T, D> UccaEvaluatorBuilder<M, T, D>
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
            delinearizer: None,
            converter: None,
        }
    }

    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Linearized gold graphs, one per line.
    pub fn gold_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.gold_file = Some(path.into());
        self
    }

    /// Sentences aligned with the gold graphs.
    pub fn sent_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sent_path = Some(path.into());
        self
    }

    /// Directory for MRP files and per-step raw predictions.
    pub fn pred_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pred_save_dir = dir.into();
        self
    }

    pub fn split(mut self, split: impl Into<String>) -> Self {
        self.config.split = split.into();
        self
    }

    /// Beam width; zero is rejected by `build`.
    pub fn num_beams(mut self, num_beams: usize) -> Self {
        self.config.num_beams = num_beams;
        self
    }

    pub fn scorer(mut self, scorer: impl GraphScorer + 'static) -> Self {
        self.scorer = Some(Box::new(scorer));
        self
    }

    pub fn delinearizer(mut self, delinearizer: impl Delinearizer + 'static) -> Self {
        self.delinearizer = Some(Box::new(delinearizer));
        self
    }

    pub fn converter(mut self, converter: impl MrpConverter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    /// Reads gold graphs and sentences eagerly.
    pub fn build(self) -> anyhow::Result<UccaEvaluator<M, T, D>> {
        self.config.validate()?;
        let gold_file = self
            .gold_file
            .ok_or_else(|| anyhow::anyhow!("UCCA evaluator needs a gold file"))?;
        let sent_path = self
            .sent_path
            .ok_or_else(|| anyhow::anyhow!("UCCA evaluator needs a sentence file"))?;
        let gold_graphs = read_lines(&gold_file)?;
        let sents = read_lines(&sent_path)?;

        let toy_tree = BracketDelinearizer
            .delinearize(TOY_GRAPH)
            .context("parsing the fallback UCCA graph")?;

        let config = self.config;
        let scorer = self.scorer.unwrap_or_else(|| {
            Box::new(
                MtoolScorer::new(config.mtool.clone())
                    .env(ScorerEnv::tokenizers_parallelism(config.tokenizers_parallelism)),
            )
        });

        Ok(UccaEvaluator {
            model: self.model,
            tokenizer: self.tokenizer,
            dataloader: self.dataloader,
            gold_graphs,
            sents,
            pred_save_dir: config.pred_save_dir.clone(),
            split: config.split.clone(),
            decode: DecodeSettings::from_config(&config),
            toy_tree,
            delinearizer: self
                .delinearizer
                .unwrap_or_else(|| Box::new(BracketDelinearizer)),
            converter: self.converter.unwrap_or_else(|| Box::new(UccaMrpConverter)),
            scorer,
            n_step: None,
        })
    }
}
