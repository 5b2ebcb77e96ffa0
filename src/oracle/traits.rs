// Similarity oracle trait: the swap-ready abstraction.
//
// Scoring a concept against a sentence only needs pairwise (term, word)
// similarities. Any embedding backend that can answer that question
// implements this trait; the default is a word2vec table.

use thiserror::Error;

/// Why a single (term, word) lookup produced no score.
///
/// Misses are expected during matching (sentences contain words the model
/// never saw) and are skipped by the scoring loop rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleMiss {
    #[error("term not in vocabulary: {0:?}")]
    UnknownTerm(String),
    #[error("word not in vocabulary: {0:?}")]
    UnknownWord(String),
}

/// Trait for pairwise term/word similarity. Implementations must be
/// `Send + Sync` so a built taxonomy can be shared across query threads.
pub trait SimilarityOracle: Send + Sync {
    /// Whether the oracle has been populated and can answer queries.
    fn ready(&self) -> bool;

    /// Similarity between a concept term and a sentence word, in [-1, 1].
    fn similarity(&self, term: &str, word: &str) -> Result<f64, OracleMiss>;

    /// Number of entries the oracle knows about (diagnostics only).
    fn vocab_size(&self) -> usize {
        0
    }

    /// Vector dimensionality, if the oracle is embedding-backed.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}
