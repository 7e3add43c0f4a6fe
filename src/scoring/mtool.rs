use super::process::{run_scorer, ScorerEnv};
use super::GraphScorer;
use crate::core::ScoreError;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::Path;

/// UCCA scoring through `mtool --score ucca --read mrp --gold <gold> <pred>`.
///
/// mtool prints a JSON report on stdout; the labeled primary F1 is returned,
/// rounded to three decimals.
#[derive(Debug, Clone)]
pub struct MtoolScorer {
    pub program: String,
    pub framework: String,
    pub env: ScorerEnv,
}

impl MtoolScorer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            framework: "ucca".to_string(),
            env: ScorerEnv::default(),
        }
    }

    pub fn env(mut self, env: ScorerEnv) -> Self {
        self.env = env;
        self
    }
}

impl Default for MtoolScorer {
    fn default() -> Self {
        Self::new("mtool")
    }
}

impl GraphScorer for MtoolScorer {
    fn score(&self, gold: &Path, pred: &Path) -> Result<f64, ScoreError> {
        let args = [
            OsStr::new("--score"),
            OsStr::new(&self.framework),
            OsStr::new("--read"),
            OsStr::new("mrp"),
            OsStr::new("--gold"),
            gold.as_os_str(),
            pred.as_os_str(),
        ];
        let stdout = run_scorer(&self.program, &args, None, &self.env)?;
        labeled_primary_f1(&stdout)
    }

    fn name(&self) -> &str {
        "mtool"
    }
}

/// Extract `labeled.primary.f` from an mtool report, rounded to 3 places.
pub fn labeled_primary_f1(report: &str) -> Result<f64, ScoreError> {
    let report: Value =
        serde_json::from_str(report).map_err(|e| ScoreError::Output(format!("mtool report: {e}")))?;
    let f1 = report
        .pointer("/labeled/primary/f")
        .and_then(Value::as_f64)
        .ok_or_else(|| ScoreError::Output("mtool report has no labeled.primary.f".to_string()))?;
    Ok((f1 * 1000.0).round() / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_rounds_f1() {
        let report = r#"{"labeled": {"primary": {"p": 0.5, "r": 0.5, "f": 0.87654}, "remote": {"f": 0.1}}}"#;
        assert_eq!(labeled_primary_f1(report).unwrap(), 0.877);
    }

    #[test]
    fn missing_field_is_an_output_error() {
        let err = labeled_primary_f1(r#"{"unlabeled": {}}"#).unwrap_err();
        assert!(matches!(err, ScoreError::Output(_)));
    }

    #[test]
    fn garbage_is_an_output_error() {
        assert!(matches!(labeled_primary_f1("not json"), Err(ScoreError::Output(_))));
    }
}
