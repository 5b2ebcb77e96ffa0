// Greedy descent matcher.
//
// Starting from the taxonomy roots, every concept in the current frontier is
// scored against the sentence. The best one wins; if it has children they
// become the next frontier, otherwise the scored frontier is the answer:
//
//   frontier = roots
//   loop:
//     results = sort_desc(score(n) for n in frontier)   # stable
//     winner  = results[0]
//     if winner has children: trace += winner; frontier = children
//     else: return (results, trace)
//
// The sort is stable, so equal scores keep listing order and an empty
// sentence walks down the leftmost branch. Nothing here mutates the
// taxonomy, so one Taxonomy can serve any number of concurrent matchers.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::trace::DescentTrace;
use crate::taxonomy::node::{ConceptNode, MatchResult};
use crate::taxonomy::tree::Taxonomy;

/// Errors that abort a match. Per-word oracle misses never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("similarity model is not loaded; load the model before matching")]
    OracleNotReady,

    #[error("taxonomy has no root concepts to match against")]
    EmptyTaxonomy,

    #[error("winning term {0:?} is not in the taxonomy index")]
    UnknownTerm(String),
}

/// Matching knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Reserved. Accepted for API compatibility but does not truncate
    /// anything: the result list is always the complete leaf-level frontier.
    pub topk: usize,
    /// Similarities must be strictly greater than this to count.
    pub threshold: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            topk: 1,
            threshold: 0.0,
        }
    }
}

/// Outcome of one descent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Every concept of the final frontier, best first
    pub results: Vec<MatchResult>,
    pub trace: DescentTrace,
}

impl Classification {
    /// The winning leaf-level result.
    pub fn best(&self) -> Option<&MatchResult> {
        self.results.first()
    }

    /// Full root-to-leaf path: the trace plus the winning leaf term.
    pub fn path(&self) -> Vec<&str> {
        let mut path: Vec<&str> = self.trace.terms().iter().map(String::as_str).collect();
        if let Some(best) = self.best() {
            path.push(&best.term);
        }
        path
    }
}

/// Runs greedy descents over a borrowed taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    taxonomy: &'a Taxonomy,
    options: MatchOptions,
}

impl<'a> Matcher<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self::with_options(taxonomy, MatchOptions::default())
    }

    pub fn with_options(taxonomy: &'a Taxonomy, options: MatchOptions) -> Self {
        Self { taxonomy, options }
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Classify a pre-split sentence.
    pub fn classify<S: AsRef<str>>(&self, sentence: &[S]) -> Result<Classification, MatchError> {
        if !self.taxonomy.oracle().ready() {
            return Err(MatchError::OracleNotReady);
        }

        let mut frontier: Vec<&ConceptNode> = self.taxonomy.root_nodes().collect();
        if frontier.is_empty() {
            return Err(MatchError::EmptyTaxonomy);
        }

        let mut trace = DescentTrace::default();

        loop {
            let mut results: Vec<MatchResult> = frontier
                .iter()
                .map(|node| self.taxonomy.score(node, sentence, self.options.threshold))
                .collect();

            // Stable: equal scores keep frontier order
            results.sort_by(|a, b| b.score.total_cmp(&a.score));

            let top = results.first().ok_or(MatchError::EmptyTaxonomy)?;
            let winner = self
                .taxonomy
                .get(&top.term)
                .ok_or_else(|| MatchError::UnknownTerm(top.term.clone()))?;

            debug!(
                depth = trace.len(),
                frontier = frontier.len(),
                winner = winner.term(),
                score = top.score,
                "Scored frontier"
            );

            if winner.is_leaf() {
                return Ok(Classification { results, trace });
            }

            trace.push(winner.term());
            frontier = self.taxonomy.children(winner).collect();
        }
    }
}
