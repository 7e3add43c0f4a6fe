use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by an external scorer invocation.
///
/// Evaluators match on these variants to decide whether a failure degrades
/// the run or aborts it.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The gold reference file does not exist; no subprocess was started.
    #[error("reference file not found: {}", .0.display())]
    MissingReference(PathBuf),

    /// The scorer binary could not be started at all.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scorer ran but exited unsuccessfully.
    #[error("`{program}` exited with status {code:?}: {stderr}")]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The scorer finished but its report could not be read or understood.
    #[error("unreadable scorer output: {0}")]
    Output(String),
}

/// Errors raised by the evaluation pipelines themselves.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("dataloader produced no batches")]
    EmptyDataloader,

    #[error("misaligned inputs: {predictions} predictions, {graphs} gold graphs, {sentences} sentences")]
    Misaligned {
        predictions: usize,
        graphs: usize,
        sentences: usize,
    },

    #[error("token `{0}` is not in the vocabulary")]
    UnknownToken(String),

    #[error("tokenizer failure: {0}")]
    Tokenizer(String),

    #[error("no source languages configured")]
    NoLanguages,

    #[error("unsupported language code `{0}`")]
    UnsupportedLanguage(String),
}
