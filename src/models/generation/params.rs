use crate::core::config::{DEFAULT_LENGTH_PENALTY, DEFAULT_MAX_LENGTH, DEFAULT_NUM_BEAMS};

/// Decoding parameters handed to [`Seq2SeqModel::generate`](crate::models::Seq2SeqModel::generate).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub decoder_start_token_id: u32,
    /// Token forced as the first generated token after the decoder start.
    pub forced_bos_token_id: Option<u32>,
    /// Token sequences that must never be produced.
    pub bad_words_ids: Option<Vec<Vec<u32>>>,
    pub num_beams: usize,
    /// Maximum sequence length, decoder start token included.
    pub max_length: usize,
    pub length_penalty: f32,
}

impl GenerateOptions {
    pub fn new(decoder_start_token_id: u32) -> Self {
        Self {
            decoder_start_token_id,
            forced_bos_token_id: None,
            bad_words_ids: None,
            num_beams: DEFAULT_NUM_BEAMS,
            max_length: DEFAULT_MAX_LENGTH,
            length_penalty: DEFAULT_LENGTH_PENALTY,
        }
    }

    pub fn forced_bos_token_id(mut self, token_id: u32) -> Self {
        self.forced_bos_token_id = Some(token_id);
        self
    }

    /// Empty lists are ignored; `None` when nothing remains.
    pub fn bad_words_ids(mut self, bad_words_ids: Vec<Vec<u32>>) -> Self {
        let bad_words_ids: Vec<Vec<u32>> =
            bad_words_ids.into_iter().filter(|w| !w.is_empty()).collect();
        self.bad_words_ids = (!bad_words_ids.is_empty()).then_some(bad_words_ids);
        self
    }

    pub fn num_beams(mut self, num_beams: usize) -> Self {
        self.num_beams = num_beams.max(1);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn length_penalty(mut self, length_penalty: f32) -> Self {
        self.length_penalty = length_penalty;
        self
    }
}
