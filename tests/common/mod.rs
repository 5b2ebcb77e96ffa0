// Shared fixtures for integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use rulebase::oracle::traits::{OracleMiss, SimilarityOracle};
use rulebase::taxonomy::tree::Taxonomy;

/// Oracle backed by an explicit (term, word) -> score table.
///
/// Pairs not in the table miss with UnknownWord, which is how a real
/// embedding table behaves for out-of-vocabulary sentence words.
#[derive(Debug, Clone, Default)]
pub struct FixedOracle {
    scores: HashMap<(String, String), f64>,
    not_ready: bool,
}

#[allow(dead_code)]
impl FixedOracle {
    pub fn new(pairs: &[(&str, &str, f64)]) -> Self {
        Self {
            scores: pairs
                .iter()
                .map(|&(t, w, s)| ((t.to_string(), w.to_string()), s))
                .collect(),
            not_ready: false,
        }
    }

    pub fn unloaded() -> Self {
        Self {
            not_ready: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, term: &str, word: &str, score: f64) {
        self.scores.insert((term.to_string(), word.to_string()), score);
    }
}

impl SimilarityOracle for FixedOracle {
    fn ready(&self) -> bool {
        !self.not_ready
    }

    fn similarity(&self, term: &str, word: &str) -> Result<f64, OracleMiss> {
        self.scores
            .get(&(term.to_string(), word.to_string()))
            .copied()
            .ok_or_else(|| OracleMiss::UnknownWord(word.to_string()))
    }

    fn vocab_size(&self) -> usize {
        self.scores.len()
    }
}

/// The purchase example: one root with two children, declared root-first.
#[allow(dead_code)]
pub const PURCHASE_LISTING: &[&str] = &["Purchase", "Drinks Purchase", "Food Purchase"];

#[allow(dead_code)]
pub fn build(lines: &[&str], oracle: FixedOracle) -> Taxonomy {
    Taxonomy::build(lines, Arc::new(oracle)).expect("test taxonomy should build")
}
