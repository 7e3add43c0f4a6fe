//! Logit processors applied before each beam-search step.

use candle_core::{Result, Tensor};

/// Set banned continuations to `-inf`.
///
/// A single-token entry is always banned. A longer entry bans its last token
/// only when the hypothesis already ends with the rest of the entry.
pub fn suppress_bad_words(logits: &Tensor, bad_words_ids: &[Vec<u32>], generated: &[u32]) -> Result<Tensor> {
    let device = logits.device();
    let mut logits = logits.to_dtype(candle_core::DType::F32)?.to_vec1::<f32>()?;
    for word in bad_words_ids {
        let Some((last, prefix)) = word.split_last() else {
            continue;
        };
        if generated.ends_with(prefix) {
            if let Some(logit) = logits.get_mut(*last as usize) {
                *logit = f32::NEG_INFINITY;
            }
        }
    }
    let logits_len = logits.len();
    Tensor::from_vec(logits, logits_len, device)
}

/// Leave only `token_id` selectable.
pub fn force_token(logits: &Tensor, token_id: u32) -> Result<Tensor> {
    let device = logits.device();
    let vocab_size = logits.dim(0)?;
    let forced: Vec<f32> = (0..vocab_size)
        .map(|i| if i == token_id as usize { 0.0 } else { f32::NEG_INFINITY })
        .collect();
    Tensor::from_vec(forced, vocab_size, device)
}
