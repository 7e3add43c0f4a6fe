pub mod generation;

pub use generation::GenerateOptions;

use crate::data::Batch;
use candle_core::{Device, Tensor};

/// Model seam used by the evaluators.
///
/// Implementations compute the label cross-entropy of a batch and decode
/// token sequences from its inputs. Rows in the output of `generate` follow
/// the row order of `input_ids`.
pub trait Seq2SeqModel {
    fn loss(&self, batch: &Batch) -> anyhow::Result<f32>;

    fn generate(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        options: &GenerateOptions,
    ) -> anyhow::Result<Vec<Vec<u32>>>;
}

/// Encoder-decoder network exposing raw logits.
///
/// [`BeamSearchModel`] turns any implementation into a [`Seq2SeqModel`].
pub trait Seq2SeqLm {
    /// `(batch, src_len)` ids and mask to `(batch, src_len, hidden)` states.
    fn encode(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor>;

    /// `(batch, tgt_len)` decoder ids to `(batch, tgt_len, vocab)` logits.
    fn decode(
        &self,
        decoder_input_ids: &Tensor,
        encoder_states: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor>;

    fn eos_token_id(&self) -> u32;

    fn pad_token_id(&self) -> u32;

    fn device(&self) -> &Device;
}

/// Beam-search decoding and cross-entropy loss on top of a [`Seq2SeqLm`].
pub struct BeamSearchModel<M: Seq2SeqLm> {
    model: M,
    /// First decoder token when shifting labels right for the loss.
    decoder_start_token_id: u32,
}

impl<M: Seq2SeqLm> BeamSearchModel<M> {
    pub fn new(model: M, decoder_start_token_id: u32) -> Self {
        Self {
            model,
            decoder_start_token_id,
        }
    }

    pub fn inner(&self) -> &M {
        &self.model
    }

    pub fn device(&self) -> &Device {
        self.model.device()
    }

    /// `[start, l0, l1, ..., l(n-2)]` for every label row.
    fn shift_right(&self, labels: &[Vec<u32>]) -> Vec<Vec<u32>> {
        labels
            .iter()
            .map(|row| {
                std::iter::once(self.decoder_start_token_id)
                    .chain(row.iter().take(row.len().saturating_sub(1)).copied())
                    .collect()
            })
            .collect()
    }
}

impl<M: Seq2SeqLm> Seq2SeqModel for BeamSearchModel<M> {
    fn loss(&self, batch: &Batch) -> anyhow::Result<f32> {
        let labels = batch.label_rows()?;
        let (batch_size, tgt_len) = batch.labels.dims2()?;
        let decoder_rows: Vec<u32> = self.shift_right(&labels).into_iter().flatten().collect();
        let decoder_input = Tensor::from_vec(decoder_rows, (batch_size, tgt_len), self.device())?;

        let encoder_states = self.model.encode(&batch.input_ids, &batch.attention_mask)?;
        let logits = self
            .model
            .decode(&decoder_input, &encoder_states, &batch.attention_mask)?;
        let vocab_size = logits.dim(2)?;
        let logits = logits.reshape((batch_size * tgt_len, vocab_size))?;

        // pad positions do not contribute
        let pad = self.model.pad_token_id();
        let flat_labels: Vec<u32> = labels.into_iter().flatten().collect();
        let keep: Vec<u32> = flat_labels
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t != pad)
            .map(|(i, _)| i as u32)
            .collect();
        if keep.is_empty() {
            return Ok(0.0);
        }
        let targets: Vec<u32> = keep.iter().map(|&i| flat_labels[i as usize]).collect();
        let keep_len = keep.len();
        let keep = Tensor::from_vec(keep, keep_len, self.device())?;
        let targets = Tensor::from_vec(targets, keep_len, self.device())?;

        let logits = logits.index_select(&keep, 0)?.to_dtype(candle_core::DType::F32)?;
        let loss = candle_nn::loss::cross_entropy(&logits, &targets)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    fn generate(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        options: &GenerateOptions,
    ) -> anyhow::Result<Vec<Vec<u32>>> {
        let encoder_states = self.model.encode(input_ids, attention_mask)?;
        let batch_size = input_ids.dim(0)?;

        (0..batch_size)
            .map(|row| {
                let states = encoder_states.narrow(0, row, 1)?;
                let mask = attention_mask.narrow(0, row, 1)?;
                generation::beam_search(&self.model, &states, &mask, options)
            })
            .collect()
    }
}
