//! Tokenizer seam used by the evaluators.
//!
//! The evaluators only need three operations: looking up control tokens
//! (decoder start, forced BOS), decoding generated ids and encoding word
//! lists for bad-word suppression. [`Seq2SeqTokenizer`] captures those and is
//! implemented for [`tokenizers::Tokenizer`].

use crate::core::EvalError;

pub trait Seq2SeqTokenizer {
    /// Map tokens to their vocabulary ids, failing on unknown tokens.
    fn convert_tokens_to_ids(&self, tokens: &[&str]) -> anyhow::Result<Vec<u32>>;

    fn batch_decode(
        &self,
        sequences: &[Vec<u32>],
        skip_special_tokens: bool,
    ) -> anyhow::Result<Vec<String>>;

    fn encode_batch(
        &self,
        texts: &[&str],
        add_special_tokens: bool,
    ) -> anyhow::Result<Vec<Vec<u32>>>;

    fn pad_token_id(&self) -> u32;

    /// Id of a single token.
    fn token_id(&self, token: &str) -> anyhow::Result<u32> {
        let ids = self.convert_tokens_to_ids(&[token])?;
        ids.first()
            .copied()
            .ok_or_else(|| EvalError::UnknownToken(token.to_string()).into())
    }
}

impl Seq2SeqTokenizer for tokenizers::Tokenizer {
    fn convert_tokens_to_ids(&self, tokens: &[&str]) -> anyhow::Result<Vec<u32>> {
        tokens
            .iter()
            .map(|token| {
                self.token_to_id(token)
                    .ok_or_else(|| EvalError::UnknownToken(token.to_string()).into())
            })
            .collect()
    }

    fn batch_decode(
        &self,
        sequences: &[Vec<u32>],
        skip_special_tokens: bool,
    ) -> anyhow::Result<Vec<String>> {
        let slices: Vec<&[u32]> = sequences.iter().map(|s| s.as_slice()).collect();
        self.decode_batch(&slices, skip_special_tokens)
            .map_err(|e| EvalError::Tokenizer(e.to_string()).into())
    }

    fn encode_batch(
        &self,
        texts: &[&str],
        add_special_tokens: bool,
    ) -> anyhow::Result<Vec<Vec<u32>>> {
        // Deref to the inner `TokenizerImpl` so this does not resolve back to the trait method.
        let encodings = (**self)
            .encode_batch(texts.to_vec(), add_special_tokens)
            .map_err(|e| EvalError::Tokenizer(e.to_string()))?;
        Ok(encodings.iter().map(|e| e.get_ids().to_vec()).collect())
    }

    fn pad_token_id(&self) -> u32 {
        self.get_padding()
            .map(|p| p.pad_id)
            .or_else(|| self.token_to_id("<pad>"))
            .unwrap_or(0)
    }
}
