//! Tokenizer loading from local files or the Hugging Face Hub.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use seq2seq_eval::loaders::TokenizerLoader;
//!
//! let tokenizer = TokenizerLoader::hub("facebook/mbart-large-50", "tokenizer.json").load()?;
//! let local = TokenizerLoader::file("checkpoints/tokenizer.json").load()?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Hub downloads retry when the local cache lock is held by another process.

use hf_hub::api::sync::ApiBuilder;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = ApiBuilder::new().build()?.model(self.repo.clone());

        let mut attempt = 0;
        loop {
            match hf_api.get(self.filename.as_str()) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    attempt += 1;
                    if e.to_string().contains("Lock acquisition failed") && attempt < MAX_RETRIES {
                        let wait = std::time::Duration::from_millis(100 * (1 << attempt));
                        tracing::debug!(repo = %self.repo, attempt, "hub lock busy, retrying");
                        std::thread::sleep(wait);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum TokenizerSource {
    File(PathBuf),
    Hub(HfLoader),
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    pub source: TokenizerSource,
}

impl TokenizerLoader {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            source: TokenizerSource::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn hub(repo: &str, filename: &str) -> Self {
        Self {
            source: TokenizerSource::Hub(HfLoader::new(repo, filename)),
        }
    }

    pub fn load(&self) -> anyhow::Result<Tokenizer> {
        let path = match &self.source {
            TokenizerSource::File(path) => path.clone(),
            TokenizerSource::Hub(loader) => loader.load()?,
        };

        let tokenizer = Tokenizer::from_file(&path).map_err(anyhow::Error::msg)?;
        tracing::info!(path = %path.display(), "loaded tokenizer");

        Ok(tokenizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_local_file_is_an_error() {
        let loader = TokenizerLoader::file("/definitely/not/here/tokenizer.json");
        assert!(loader.load().is_err());
    }
}
