use crate::core::ScoreError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

const MAX_OUTPUT: usize = 64 * 1024;

/// Environment overrides applied to scorer subprocesses only.
///
/// The parent process environment is never touched, so several evaluators
/// can score at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorerEnv {
    vars: Vec<(String, String)>,
}

impl ScorerEnv {
    pub fn empty() -> Self {
        Self { vars: Vec::new() }
    }

    /// `TOKENIZERS_PARALLELISM` for the child; `false` silences the fork warning
    /// of Hugging Face tokenizers in Python scorers.
    pub fn tokenizers_parallelism(enabled: bool) -> Self {
        Self::empty().with_var("TOKENIZERS_PARALLELISM", if enabled { "true" } else { "false" })
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value.into()));
        self
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    fn apply(&self, cmd: &mut Command) {
        for (k, v) in &self.vars {
            cmd.env(k, v);
        }
    }
}

impl Default for ScorerEnv {
    fn default() -> Self {
        Self::tokenizers_parallelism(false)
    }
}

fn truncate_output(raw: &[u8]) -> String {
    if raw.len() <= MAX_OUTPUT {
        String::from_utf8_lossy(raw).to_string()
    } else {
        format!(
            "{}\n... [truncated at {} bytes, total {}]",
            String::from_utf8_lossy(&raw[..MAX_OUTPUT]),
            MAX_OUTPUT,
            raw.len()
        )
    }
}

/// Run a scorer to completion and return its full stdout.
///
/// Blocks without a timeout. A non-zero exit maps to [`ScoreError::ExitStatus`]
/// carrying the (truncated) stderr.
pub fn run_scorer<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    cwd: Option<&Path>,
    env: &ScorerEnv,
) -> Result<String, ScoreError> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    env.apply(&mut cmd);

    tracing::debug!(program, ?cwd, "running scorer");
    let output = cmd.output().map_err(|source| ScoreError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(ScoreError::ExitStatus {
            program: program.to_string(),
            code: output.status.code(),
            stderr: truncate_output(&output.stderr),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_replace_existing_keys() {
        let env = ScorerEnv::default().with_var("TOKENIZERS_PARALLELISM", "true");
        assert_eq!(
            env.vars(),
            &[("TOKENIZERS_PARALLELISM".to_string(), "true".to_string())]
        );
    }

    #[test]
    fn child_sees_override_parent_does_not() {
        let before = std::env::var("SEQ2SEQ_EVAL_PROBE").ok();
        let env = ScorerEnv::empty().with_var("SEQ2SEQ_EVAL_PROBE", "child");
        let out = run_scorer("sh", &["-c", "printf %s \"$SEQ2SEQ_EVAL_PROBE\""], None, &env).unwrap();
        assert_eq!(out, "child");
        assert_eq!(std::env::var("SEQ2SEQ_EVAL_PROBE").ok(), before);
    }

    #[test]
    fn non_zero_exit_is_reported() {
        let err = run_scorer("sh", &["-c", "echo boom >&2; exit 3"], None, &ScorerEnv::empty())
            .unwrap_err();
        match err {
            ScoreError::ExitStatus { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = run_scorer::<&str>("definitely-not-a-scorer-binary", &[], None, &ScorerEnv::empty())
            .unwrap_err();
        assert!(matches!(err, ScoreError::Spawn { .. }));
    }

    #[test]
    fn long_stdout_is_returned_whole() {
        let script = format!("head -c {} /dev/zero | tr '\\0' x", MAX_OUTPUT + 100);
        let out = run_scorer("sh", &["-c", script.as_str()], None, &ScorerEnv::empty()).unwrap();
        assert_eq!(out.len(), MAX_OUTPUT + 100);
        assert!(out.bytes().all(|b| b == b'x'));
    }

    #[test]
    fn long_stderr_is_truncated() {
        let raw = vec![b'x'; MAX_OUTPUT + 10];
        assert!(truncate_output(&raw).contains("truncated"));
    }
}
