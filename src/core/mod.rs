pub mod config;
pub mod error;

pub use config::EvalConfig;
pub use error::{EvalError, ScoreError};
