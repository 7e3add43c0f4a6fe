use super::process::{run_scorer, ScorerEnv};
use super::GraphScorer;
use crate::core::ScoreError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// smatch, run from an AMR script checkout:
/// `python smatch/smatch.py -f <pred> <gold> -r 5 --significant 3`.
///
/// The script writes its F-score to `smatch/f_score.txt` inside the checkout,
/// which is read back after a successful run.
#[derive(Debug, Clone)]
pub struct SmatchScorer {
    pub script_dir: PathBuf,
    pub python: String,
    pub restarts: u32,
    pub significant: u32,
    pub env: ScorerEnv,
}

impl SmatchScorer {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            python: "python".to_string(),
            restarts: 5,
            significant: 3,
            env: ScorerEnv::default(),
        }
    }

    pub fn python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn env(mut self, env: ScorerEnv) -> Self {
        self.env = env;
        self
    }

    pub fn result_file(&self) -> PathBuf {
        self.script_dir.join("smatch").join("f_score.txt")
    }
}

impl GraphScorer for SmatchScorer {
    fn score(&self, gold: &Path, pred: &Path) -> Result<f64, ScoreError> {
        // the scorer runs inside the checkout, relative paths would dangle
        let pred = pred.canonicalize().unwrap_or_else(|_| pred.to_path_buf());
        let gold = gold.canonicalize().unwrap_or_else(|_| gold.to_path_buf());
        let restarts = self.restarts.to_string();
        let significant = self.significant.to_string();
        let args = [
            OsStr::new("smatch/smatch.py"),
            OsStr::new("-f"),
            pred.as_os_str(),
            gold.as_os_str(),
            OsStr::new("-r"),
            OsStr::new(&restarts),
            OsStr::new("--significant"),
            OsStr::new(&significant),
        ];
        run_scorer(&self.python, &args, Some(&self.script_dir), &self.env)?;

        let result_file = self.result_file();
        let raw = std::fs::read_to_string(&result_file)
            .map_err(|e| ScoreError::Output(format!("{}: {e}", result_file.display())))?;
        raw.trim()
            .parse::<f64>()
            .map_err(|e| ScoreError::Output(format!("{}: {e}", result_file.display())))
    }

    fn name(&self) -> &str {
        "smatch"
    }
}
