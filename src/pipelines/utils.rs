//! Pieces shared by every evaluation pipeline.

use crate::core::{EvalConfig, EvalError};
use crate::data::DataLoader;
use crate::models::{GenerateOptions, Seq2SeqModel};
use crate::tokenizer::Seq2SeqTokenizer;
use anyhow::Context;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Beam settings shared by all pipelines; task-specific tokens are added per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeSettings {
    pub num_beams: usize,
    pub max_length: usize,
    pub length_penalty: f32,
}

impl DecodeSettings {
    pub fn from_config(config: &EvalConfig) -> Self {
        Self {
            num_beams: config.num_beams,
            max_length: config.max_length,
            length_penalty: config.length_penalty,
        }
    }

    pub fn options(&self, decoder_start_token_id: u32) -> GenerateOptions {
        GenerateOptions::new(decoder_start_token_id)
            .num_beams(self.num_beams)
            .max_length(self.max_length)
            .length_penalty(self.length_penalty)
    }
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self::from_config(&EvalConfig::default())
    }
}

/// Predictions and per-batch losses from one pass over a dataloader.
#[derive(Debug, Clone, Default)]
pub struct Generated {
    pub predictions: Vec<String>,
    pub losses: Vec<f32>,
    /// Decoded `labels`, filled only when references were requested.
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationPass {
    pub with_loss: bool,
    pub with_references: bool,
}

/// Run the model over every batch in order: loss (optional), generation,
/// decoding with special tokens skipped.
pub fn generate_batches<M, T, D>(
    model: &M,
    tokenizer: &T,
    dataloader: &D,
    options: &GenerateOptions,
    pass: GenerationPass,
) -> anyhow::Result<Generated>
where
    M: Seq2SeqModel + ?Sized,
    T: Seq2SeqTokenizer + ?Sized,
    D: DataLoader + ?Sized,
{
    let total = dataloader.num_batches();
    let mut out = Generated::default();
    let mut seen = 0usize;

    for (i, batch) in dataloader.batches().enumerate() {
        seen += 1;
        let batch = batch.with_context(|| format!("loading batch {i}"))?;

        if pass.with_loss {
            out.losses.push(model.loss(&batch)?);
        }

        let generated = model.generate(&batch.input_ids, &batch.attention_mask, options)?;
        out.predictions
            .extend(tokenizer.batch_decode(&generated, true)?);

        if pass.with_references {
            out.references
                .extend(tokenizer.batch_decode(&batch.label_rows()?, true)?);
        }

        debug!(batch = i + 1, total, "generated batch");
    }

    if seen == 0 {
        return Err(EvalError::EmptyDataloader.into());
    }

    info!(predictions = out.predictions.len(), batches = seen, "generation finished");
    Ok(out)
}

pub fn mean_loss(losses: &[f32]) -> Option<f32> {
    if losses.is_empty() {
        return None;
    }
    Some(losses.iter().sum::<f32>() / losses.len() as f32)
}

/// `step_{n}`, or `step_latest` when no step is given.
pub fn step_dir(root: &Path, n_step: Option<u64>) -> PathBuf {
    match n_step {
        Some(n) => root.join(format!("step_{n}")),
        None => root.join("step_latest"),
    }
}

/// Write one prediction per line, creating parent directories.
pub fn save_predictions<S: AsRef<str>>(predictions: &[S], path: &Path) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for prediction in predictions {
        writer.write_all(prediction.as_ref().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    debug!(path = %path.display(), count = predictions.len(), "saved predictions");
    Ok(path.to_path_buf())
}
