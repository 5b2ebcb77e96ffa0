use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::taxonomy::tree::DEFAULT_DOMAIN;

/// On-disk layout of the word2vec model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// word2vec binary format (default)
    Binary,
    /// word2vec text format: one word and its components per line
    Text,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override individual fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// word2vec model file (RULEBASE_MODEL_PATH)
    pub model_path: PathBuf,
    pub model_format: ModelFormat,
    /// Taxonomy listing file (RULEBASE_TAXONOMY_PATH)
    pub taxonomy_path: PathBuf,
    /// Label for the rule set, shown in listings
    pub domain: String,
    /// Default scoring threshold (RULEBASE_THRESHOLD)
    pub threshold: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every field has a default; only a malformed value is an error.
    pub fn load() -> Result<Self> {
        let model_format = match env::var("RULEBASE_MODEL_FORMAT").as_deref() {
            Ok("text") => ModelFormat::Text,
            Ok("binary") | Err(_) => ModelFormat::Binary,
            Ok(other) => anyhow::bail!(
                "RULEBASE_MODEL_FORMAT must be \"binary\" or \"text\", got {other:?}"
            ),
        };

        let threshold = match env::var("RULEBASE_THRESHOLD") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("RULEBASE_THRESHOLD is not a number: {raw:?}"))?,
            Err(_) => 0.0,
        };

        Ok(Self {
            model_path: env::var("RULEBASE_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_path()),
            model_format,
            taxonomy_path: env::var("RULEBASE_TAXONOMY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./rules.txt")),
            domain: env::var("RULEBASE_DOMAIN").unwrap_or_else(|_| DEFAULT_DOMAIN.to_string()),
            threshold,
        })
    }

    /// Check that the model file exists.
    /// Call this before anything that needs similarity scores.
    pub fn require_model(&self) -> Result<()> {
        require_file(
            &self.model_path,
            "word2vec model",
            "Set RULEBASE_MODEL_PATH or pass --model.",
        )
    }

    /// Check that the taxonomy listing exists.
    pub fn require_taxonomy(&self) -> Result<()> {
        require_file(
            &self.taxonomy_path,
            "Taxonomy listing",
            "Set RULEBASE_TAXONOMY_PATH or pass --taxonomy.",
        )
    }
}

/// Returns the default model location.
/// Uses the platform data directory: ~/.local/share/rulebase/models/ on Linux.
pub fn default_model_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rulebase")
        .join("models")
        .join("word2vec.bin")
}

fn require_file(path: &Path, what: &str, hint: &str) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("{what} not found: {}\n{hint}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_path_layout() {
        let path = default_model_path();
        assert!(path.ends_with("rulebase/models/word2vec.bin"));
    }

    #[test]
    fn test_require_missing_file() {
        let config = Config {
            model_path: PathBuf::from("/nonexistent/word2vec.bin"),
            model_format: ModelFormat::Binary,
            taxonomy_path: PathBuf::from("/nonexistent/rules.txt"),
            domain: DEFAULT_DOMAIN.to_string(),
            threshold: 0.0,
        };
        let err = config.require_model().unwrap_err().to_string();
        assert!(err.contains("word2vec model not found"), "{err}");
        assert!(config.require_taxonomy().is_err());
    }
}
