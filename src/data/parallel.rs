use super::{Batch, DataLoader};
use crate::tokenizer::Seq2SeqTokenizer;
use anyhow::Context;
use candle_core::Device;
use std::path::Path;

/// Dataloader over a pair of line-aligned text files (source, target).
///
/// Lines are tokenized once at construction; batches are padded lazily on
/// every pass.
pub struct ParallelTextLoader {
    sources: Vec<Vec<u32>>,
    targets: Vec<Vec<u32>>,
    batch_size: usize,
    pad_token_id: u32,
    device: Device,
}

impl ParallelTextLoader {
    pub fn from_files<T: Seq2SeqTokenizer + ?Sized>(
        tokenizer: &T,
        source_path: impl AsRef<Path>,
        target_path: impl AsRef<Path>,
        batch_size: usize,
        max_length: Option<usize>,
        device: Device,
    ) -> anyhow::Result<Self> {
        let sources = read_lines(source_path.as_ref())?;
        let targets = read_lines(target_path.as_ref())?;
        if sources.len() != targets.len() {
            anyhow::bail!(
                "{} has {} lines but {} has {}",
                source_path.as_ref().display(),
                sources.len(),
                target_path.as_ref().display(),
                targets.len()
            );
        }

        let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
        let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
        Self::from_texts(tokenizer, &sources, &targets, batch_size, max_length, device)
    }

    pub fn from_texts<T: Seq2SeqTokenizer + ?Sized>(
        tokenizer: &T,
        sources: &[&str],
        targets: &[&str],
        batch_size: usize,
        max_length: Option<usize>,
        device: Device,
    ) -> anyhow::Result<Self> {
        if batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }

        let truncate = |mut rows: Vec<Vec<u32>>| {
            if let Some(max) = max_length {
                rows.iter_mut().for_each(|r| r.truncate(max));
            }
            rows
        };

        let sources = truncate(tokenizer.encode_batch(sources, true)?);
        let targets = truncate(tokenizer.encode_batch(targets, true)?);

        Ok(Self {
            sources,
            targets,
            batch_size,
            pad_token_id: tokenizer.pad_token_id(),
            device,
        })
    }

    pub fn num_examples(&self) -> usize {
        self.sources.len()
    }
}

impl DataLoader for ParallelTextLoader {
    fn batches(&self) -> Box<dyn Iterator<Item = anyhow::Result<Batch>> + '_> {
        Box::new(
            self.sources
                .chunks(self.batch_size)
                .zip(self.targets.chunks(self.batch_size))
                .map(|(src, tgt)| Batch::from_rows(src, tgt, self.pad_token_id, &self.device)),
        )
    }

    fn num_batches(&self) -> usize {
        self.sources.len().div_ceil(self.batch_size)
    }
}

pub(crate) fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}
