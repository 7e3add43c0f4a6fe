use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub const DEFAULT_NUM_BEAMS: usize = 5;
pub const DEFAULT_MAX_LENGTH: usize = 200;
pub const DEFAULT_LENGTH_PENALTY: f32 = 1.0;
const DEFAULT_PRED_SAVE_DIR: &str = "eval_predictions";
const DEFAULT_AMR_SCRIPT_DIR: &str = "amr_scripts";
const DEFAULT_PYTHON: &str = "python";
const DEFAULT_MTOOL: &str = "mtool";
const DEFAULT_SPLIT: &str = "train";
const DEFAULT_SRC_LANG: &str = "en";

/// Settings shared by the evaluators.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    pub pred_save_dir: PathBuf,
    pub amr_script_dir: PathBuf,
    pub python: String,
    pub mtool: String,
    pub num_beams: usize,
    pub max_length: usize,
    pub length_penalty: f32,
    /// Word-initial Chinese pieces (e.g. `▁了`), one per line.
    pub chinese_vocab: Option<PathBuf>,
    /// Chinese pieces glued to a prefix (e.g. `:了`), one per line.
    pub chinese_vocab_pad: Option<PathBuf>,
    pub split: String,
    pub src_lang: String,
    /// Value of `TOKENIZERS_PARALLELISM` handed to scorer subprocesses.
    pub tokenizers_parallelism: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            pred_save_dir: PathBuf::from(DEFAULT_PRED_SAVE_DIR),
            amr_script_dir: PathBuf::from(DEFAULT_AMR_SCRIPT_DIR),
            python: DEFAULT_PYTHON.to_string(),
            mtool: DEFAULT_MTOOL.to_string(),
            num_beams: DEFAULT_NUM_BEAMS,
            max_length: DEFAULT_MAX_LENGTH,
            length_penalty: DEFAULT_LENGTH_PENALTY,
            chinese_vocab: None,
            chinese_vocab_pad: None,
            split: DEFAULT_SPLIT.to_string(),
            src_lang: DEFAULT_SRC_LANG.to_string(),
            tokenizers_parallelism: false,
        }
    }
}

#[derive(Deserialize)]
struct RawEvalConfig {
    pred_save_dir: Option<PathBuf>,
    #[serde(alias = "amr_script")]
    amr_script_dir: Option<PathBuf>,
    python: Option<String>,
    mtool: Option<String>,
    #[serde(alias = "beam_size")]
    num_beams: Option<usize>,
    max_length: Option<usize>,
    length_penalty: Option<f32>,
    chinese_vocab: Option<PathBuf>,
    chinese_vocab_pad: Option<PathBuf>,
    split: Option<String>,
    src_lang: Option<String>,
    tokenizers_parallelism: Option<bool>,
}

impl EvalConfig {
    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let raw: RawEvalConfig = serde_json::from_str(content)?;
        let defaults = Self::default();

        let num_beams = raw.num_beams.unwrap_or(defaults.num_beams);

        let config = Self {
            pred_save_dir: raw.pred_save_dir.unwrap_or(defaults.pred_save_dir),
            amr_script_dir: raw.amr_script_dir.unwrap_or(defaults.amr_script_dir),
            python: raw.python.unwrap_or(defaults.python),
            mtool: raw.mtool.unwrap_or(defaults.mtool),
            num_beams,
            max_length: raw.max_length.unwrap_or(defaults.max_length),
            length_penalty: raw.length_penalty.unwrap_or(defaults.length_penalty),
            chinese_vocab: raw.chinese_vocab,
            chinese_vocab_pad: raw.chinese_vocab_pad,
            split: raw.split.unwrap_or(defaults.split),
            src_lang: raw.src_lang.unwrap_or(defaults.src_lang),
            tokenizers_parallelism: raw
                .tokenizers_parallelism
                .unwrap_or(defaults.tokenizers_parallelism),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checked by `from_json` and by every evaluator builder.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.num_beams == 0 {
            anyhow::bail!("num_beams must be at least 1");
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading eval config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing eval config {}", path.display()))
    }
}
