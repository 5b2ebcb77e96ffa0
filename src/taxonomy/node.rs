// ConceptNode: a single term in the taxonomy and its sentence scoring.
//
// A node's score against a sentence is the best similarity between its term
// and any word of the sentence. Words the oracle doesn't know are skipped,
// so one out-of-vocabulary word never sinks the whole node.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::oracle::traits::SimilarityOracle;

/// Arena index of a node. Assigned in listing order, starting at 0.
pub type NodeId = usize;

/// How well one concept matched one sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Best similarity above the threshold, or 0.0 if no word beat it
    pub score: f64,
    pub term: String,
    /// Sentence word that produced `score`, empty if none did
    pub matched_word: String,
}

/// A concept in the taxonomy. Children are arena ids, so a node listed
/// under several parents is shared rather than copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptNode {
    id: NodeId,
    term: String,
    children: Vec<NodeId>,
}

impl ConceptNode {
    pub(crate) fn new(id: NodeId, term: impl Into<String>) -> Self {
        Self {
            id,
            term: term.into(),
            children: Vec::new(),
        }
    }

    pub(crate) fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Child ids in listing order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Score this concept against a sentence.
    ///
    /// A similarity replaces the running best only if it is strictly greater
    /// than both `threshold` and the current best (which starts at 0.0), so
    /// earlier words win ties and negative similarities never register.
    pub fn score<S: AsRef<str>>(
        &self,
        oracle: &dyn SimilarityOracle,
        sentence: &[S],
        threshold: f64,
    ) -> MatchResult {
        let mut best = 0.0_f64;
        let mut matched: Option<&str> = None;

        for word in sentence {
            let word = word.as_ref();
            match oracle.similarity(&self.term, word) {
                Ok(sim) => {
                    if sim > best && sim > threshold {
                        best = sim;
                        matched = Some(word);
                    }
                }
                Err(miss) => {
                    debug!(term = %self.term, %miss, "Similarity lookup missed, skipping word");
                }
            }
        }

        MatchResult {
            score: best,
            term: self.term.clone(),
            matched_word: matched.unwrap_or_default().to_string(),
        }
    }
}
