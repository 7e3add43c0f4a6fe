use super::logits::{force_token, suppress_bad_words};
use super::params::GenerateOptions;
use crate::models::Seq2SeqLm;
use candle_core::{DType, Tensor, D};

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<u32>,
    score: f32,
}

impl Hypothesis {
    /// Sum of log-probs divided by generated length raised to the penalty.
    fn normalized(&self, length_penalty: f32) -> f32 {
        let generated = self.tokens.len().saturating_sub(1).max(1) as f32;
        self.score / generated.powf(length_penalty)
    }
}

/// Beam search over a single encoded example.
///
/// `encoder_states` and `attention_mask` carry a leading batch dimension of 1.
/// The returned sequence starts with the decoder start token and, unless the
/// length budget ran out first, ends with the model's EOS token.
pub fn beam_search<M: Seq2SeqLm + ?Sized>(
    model: &M,
    encoder_states: &Tensor,
    attention_mask: &Tensor,
    options: &GenerateOptions,
) -> anyhow::Result<Vec<u32>> {
    let eos = model.eos_token_id();
    let num_beams = options.num_beams.max(1);
    let max_length = options.max_length.max(2);

    let mut live = vec![Hypothesis {
        tokens: vec![options.decoder_start_token_id],
        score: 0.0,
    }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    while !live.is_empty() {
        let mut candidates: Vec<(usize, u32, f32)> = Vec::new();
        for (beam, hyp) in live.iter().enumerate() {
            let log_probs =
                next_token_log_probs(model, encoder_states, attention_mask, &hyp.tokens, options, max_length)?;
            for (token, log_prob) in top_k(&log_probs, 2 * num_beams) {
                if log_prob.is_finite() {
                    candidates.push((beam, token, hyp.score + log_prob));
                }
            }
        }
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut next = Vec::with_capacity(num_beams);
        for (rank, (beam, token, score)) in candidates.into_iter().enumerate() {
            let mut tokens = live[beam].tokens.clone();
            tokens.push(token);
            if token == eos {
                // only EOS among the top `num_beams` candidates closes a hypothesis
                if rank < num_beams {
                    finished.push(Hypothesis { tokens, score });
                }
            } else {
                next.push(Hypothesis { tokens, score });
            }
            if next.len() == num_beams {
                break;
            }
        }

        finished.sort_by(|a, b| {
            b.normalized(options.length_penalty)
                .total_cmp(&a.normalized(options.length_penalty))
        });
        finished.truncate(num_beams);
        live = next;

        if live.first().is_some_and(|h| h.tokens.len() >= max_length) {
            finished.append(&mut live);
            break;
        }
        if finished.len() == num_beams {
            let worst = finished[num_beams - 1].normalized(options.length_penalty);
            let best_live = live
                .iter()
                .map(|h| h.normalized(options.length_penalty))
                .fold(f32::NEG_INFINITY, f32::max);
            if best_live <= worst {
                break;
            }
        }
    }

    finished
        .into_iter()
        .max_by(|a, b| {
            a.normalized(options.length_penalty)
                .total_cmp(&b.normalized(options.length_penalty))
        })
        .map(|h| h.tokens)
        .ok_or_else(|| anyhow::anyhow!("beam search produced no hypothesis"))
}

fn next_token_log_probs<M: Seq2SeqLm + ?Sized>(
    model: &M,
    encoder_states: &Tensor,
    attention_mask: &Tensor,
    tokens: &[u32],
    options: &GenerateOptions,
    max_length: usize,
) -> anyhow::Result<Vec<f32>> {
    let decoder_input = Tensor::new(tokens, model.device())?.unsqueeze(0)?;

    // 1 x T x V -> V (logits for the last position)
    let logits = model.decode(&decoder_input, encoder_states, attention_mask)?;
    let logits = logits.squeeze(0)?.get(tokens.len() - 1)?.to_dtype(DType::F32)?;
    let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;

    let log_probs = match options.forced_bos_token_id {
        Some(bos) if tokens.len() == 1 => force_token(&log_probs, bos)?,
        _ if tokens.len() + 1 >= max_length => force_token(&log_probs, model.eos_token_id())?,
        _ => match &options.bad_words_ids {
            Some(bad_words) => suppress_bad_words(&log_probs, bad_words, tokens)?,
            None => log_probs,
        },
    };

    Ok(log_probs.to_vec1::<f32>()?)
}

fn top_k(values: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as u32, *v))
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k);
    indexed
}
