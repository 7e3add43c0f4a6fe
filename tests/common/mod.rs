// Shared stand-ins for the model, tokenizer and external scorers.
#![allow(dead_code)]

use candle_core::{Device, Tensor};
use seq2seq_eval::core::ScoreError;
use seq2seq_eval::data::{Batch, ParallelTextLoader};
use seq2seq_eval::models::{GenerateOptions, Seq2SeqModel};
use seq2seq_eval::scoring::GraphScorer;
use seq2seq_eval::tokenizer::Seq2SeqTokenizer;
use seq2seq_eval::EvalError;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SPECIAL_TOKENS: [&str; 5] = ["<pad>", "</s>", "amr", "ucca", "en_XX"];

/// Whitespace tokenizer that grows its vocabulary on encode.
pub struct WordTokenizer {
    vocab: RefCell<Vec<String>>,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self {
            vocab: RefCell::new(SPECIAL_TOKENS.iter().map(|t| t.to_string()).collect()),
        }
    }

    fn id_of(&self, word: &str) -> u32 {
        let mut vocab = self.vocab.borrow_mut();
        match vocab.iter().position(|w| w == word) {
            Some(i) => i as u32,
            None => {
                vocab.push(word.to_string());
                (vocab.len() - 1) as u32
            }
        }
    }
}

impl Seq2SeqTokenizer for WordTokenizer {
    fn convert_tokens_to_ids(&self, tokens: &[&str]) -> anyhow::Result<Vec<u32>> {
        Ok(tokens.iter().map(|t| self.id_of(t)).collect())
    }

    fn batch_decode(
        &self,
        sequences: &[Vec<u32>],
        skip_special_tokens: bool,
    ) -> anyhow::Result<Vec<String>> {
        let vocab = self.vocab.borrow();
        sequences
            .iter()
            .map(|ids| {
                let words = ids
                    .iter()
                    .filter(|&&id| !skip_special_tokens || id as usize >= SPECIAL_TOKENS.len())
                    .map(|&id| {
                        vocab
                            .get(id as usize)
                            .cloned()
                            .ok_or_else(|| EvalError::UnknownToken(id.to_string()).into())
                    })
                    .collect::<anyhow::Result<Vec<String>>>()?;
                Ok(words.join(" "))
            })
            .collect()
    }

    fn encode_batch(&self, texts: &[&str], _add_special_tokens: bool) -> anyhow::Result<Vec<Vec<u32>>> {
        Ok(texts
            .iter()
            .map(|text| text.split_whitespace().map(|w| self.id_of(w)).collect())
            .collect())
    }

    fn pad_token_id(&self) -> u32 {
        0
    }
}

/// "Generates" each input row back, padding removed, and records the
/// options of every call.
pub struct EchoModel {
    pub loss: f32,
    pub calls: Arc<Mutex<Vec<GenerateOptions>>>,
}

impl EchoModel {
    pub fn new(loss: f32) -> Self {
        Self {
            loss,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Seq2SeqModel for EchoModel {
    fn loss(&self, _batch: &Batch) -> anyhow::Result<f32> {
        Ok(self.loss)
    }

    fn generate(
        &self,
        input_ids: &Tensor,
        _attention_mask: &Tensor,
        options: &GenerateOptions,
    ) -> anyhow::Result<Vec<Vec<u32>>> {
        self.calls.lock().unwrap().push(options.clone());
        Ok(input_ids
            .to_vec2::<u32>()?
            .into_iter()
            .map(|row| row.into_iter().filter(|&id| id != 0).collect())
            .collect())
    }
}

/// Scorer returning a fixed value and remembering what it was asked to score.
#[derive(Clone)]
pub struct FixedScorer {
    pub score: f64,
    pub calls: Arc<AtomicUsize>,
    pub last: Arc<Mutex<Option<(PathBuf, PathBuf)>>>,
}

impl FixedScorer {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            calls: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GraphScorer for FixedScorer {
    fn score(&self, gold: &Path, pred: &Path) -> Result<f64, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((gold.to_path_buf(), pred.to_path_buf()));
        Ok(self.score)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Scorer whose process always exits non-zero.
pub struct FailingScorer;

impl GraphScorer for FailingScorer {
    fn score(&self, _gold: &Path, _pred: &Path) -> Result<f64, ScoreError> {
        Err(ScoreError::ExitStatus {
            program: "python".into(),
            code: Some(1),
            stderr: "Traceback: bad graph".into(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn loader(
    tokenizer: &WordTokenizer,
    sources: &[&str],
    targets: &[&str],
    batch_size: usize,
) -> ParallelTextLoader {
    ParallelTextLoader::from_texts(tokenizer, sources, targets, batch_size, None, Device::Cpu).unwrap()
}

pub fn write_lines(path: &Path, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content).unwrap();
}
