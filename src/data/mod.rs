//! Batches and the dataloaders that produce them.
//!
//! A [`DataLoader`] is a finite, restartable sequence of [`Batch`]es: every
//! call to [`DataLoader::batches`] starts again from the first batch, which is
//! what lets an evaluator be run once per training step.

pub mod parallel;

pub use parallel::ParallelTextLoader;

use candle_core::{Device, Tensor};

/// Model inputs for one step, all `u32` tensors of shape `(batch, seq_len)`.
#[derive(Debug, Clone)]
pub struct Batch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub labels: Tensor,
}

impl Batch {
    /// Pad token rows into a batch. Source and label rows are padded
    /// independently to their own longest row.
    pub fn from_rows(
        inputs: &[Vec<u32>],
        labels: &[Vec<u32>],
        pad_token_id: u32,
        device: &Device,
    ) -> anyhow::Result<Self> {
        if inputs.len() != labels.len() {
            anyhow::bail!(
                "batch has {} source rows but {} label rows",
                inputs.len(),
                labels.len()
            );
        }

        let (input_ids, attention_mask) = pad_rows(inputs, pad_token_id, device)?;
        let (labels, _) = pad_rows(labels, pad_token_id, device)?;

        Ok(Self {
            input_ids,
            attention_mask,
            labels,
        })
    }

    pub fn batch_size(&self) -> anyhow::Result<usize> {
        Ok(self.input_ids.dim(0)?)
    }

    pub fn input_rows(&self) -> anyhow::Result<Vec<Vec<u32>>> {
        Ok(self.input_ids.to_vec2::<u32>()?)
    }

    pub fn label_rows(&self) -> anyhow::Result<Vec<Vec<u32>>> {
        Ok(self.labels.to_vec2::<u32>()?)
    }
}

/// Right-pad rows and build the matching 1/0 attention mask.
fn pad_rows(rows: &[Vec<u32>], pad_token_id: u32, device: &Device) -> anyhow::Result<(Tensor, Tensor)> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(rows.len() * width);
    let mut mask = Vec::with_capacity(rows.len() * width);

    for row in rows {
        ids.extend_from_slice(row);
        ids.extend(std::iter::repeat(pad_token_id).take(width - row.len()));
        mask.extend(std::iter::repeat(1u32).take(row.len()));
        mask.extend(std::iter::repeat(0u32).take(width - row.len()));
    }

    let ids = Tensor::from_vec(ids, (rows.len(), width), device)?;
    let mask = Tensor::from_vec(mask, (rows.len(), width), device)?;
    Ok((ids, mask))
}

pub trait DataLoader {
    /// Iterate from the first batch.
    fn batches(&self) -> Box<dyn Iterator<Item = anyhow::Result<Batch>> + '_>;

    /// Number of batches one pass yields.
    fn num_batches(&self) -> usize;
}

/// Dataloader over batches already in memory.
#[derive(Debug, Clone, Default)]
pub struct VecDataLoader {
    batches: Vec<Batch>,
}

impl VecDataLoader {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }
}

impl DataLoader for VecDataLoader {
    fn batches(&self) -> Box<dyn Iterator<Item = anyhow::Result<Batch>> + '_> {
        Box::new(self.batches.iter().cloned().map(Ok))
    }

    fn num_batches(&self) -> usize {
        self.batches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_masks() {
        let batch = Batch::from_rows(
            &[vec![5, 6, 7], vec![8]],
            &[vec![9], vec![10, 11]],
            0,
            &Device::Cpu,
        )
        .unwrap();

        assert_eq!(batch.input_rows().unwrap(), vec![vec![5, 6, 7], vec![8, 0, 0]]);
        assert_eq!(
            batch.attention_mask.to_vec2::<u32>().unwrap(),
            vec![vec![1, 1, 1], vec![1, 0, 0]]
        );
        assert_eq!(batch.label_rows().unwrap(), vec![vec![9, 0], vec![10, 11]]);
        assert_eq!(batch.batch_size().unwrap(), 2);
    }

    #[test]
    fn mismatched_rows_rejected() {
        assert!(Batch::from_rows(&[vec![1]], &[], 0, &Device::Cpu).is_err());
    }

    #[test]
    fn vec_loader_restarts() {
        let batch = Batch::from_rows(&[vec![1]], &[vec![2]], 0, &Device::Cpu).unwrap();
        let loader = VecDataLoader::new(vec![batch.clone(), batch]);
        assert_eq!(loader.batches().count(), 2);
        assert_eq!(loader.batches().count(), 2);
        assert_eq!(loader.num_batches(), 2);
    }
}
