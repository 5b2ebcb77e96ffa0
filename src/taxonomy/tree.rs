// Taxonomy: the arena-backed concept forest.
//
// Nodes live in a Vec indexed by NodeId (creation order) and are looked up
// by term through a HashMap. Roots and children are lists of ids. A child
// listed under several parents is a single node referenced from each of
// them, so the structure is a DAG rather than a strict tree.
//
// Parents must be declared before they are referenced and terms are
// unique, so every child id is larger than each of its parents' ids. That
// ordering makes the graph acyclic and lets depth be computed in one
// reverse pass.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::listing::parse_line;
use super::node::{ConceptNode, MatchResult, NodeId};
use crate::oracle::traits::SimilarityOracle;

/// Domain label used when none is configured.
pub const DEFAULT_DOMAIN: &str = "general";

/// Errors raised while building a taxonomy. Any of these leaves no usable
/// taxonomy behind; there is no partial recovery.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("similarity model is not loaded; load the model before building the taxonomy")]
    OracleNotReady,

    #[error("line {line}: duplicate term {term:?}")]
    DuplicateTerm { term: String, line: usize },

    #[error("line {line}: parent {parent:?} of {child:?} has not been declared yet")]
    UnknownParent {
        parent: String,
        child: String,
        line: usize,
    },

    #[error("failed to read taxonomy {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Shape summary of a taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxonomyStats {
    pub nodes: usize,
    pub roots: usize,
    pub leaves: usize,
    /// Number of nodes on the longest root-to-leaf path (0 when empty)
    pub max_depth: usize,
}

/// A loaded concept taxonomy plus the oracle its nodes are scored with.
pub struct Taxonomy {
    domain: String,
    nodes: Vec<ConceptNode>,
    terms: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
    oracle: Arc<dyn SimilarityOracle>,
}

impl Taxonomy {
    /// Build a taxonomy from listing lines, in order.
    ///
    /// Each non-blank line is `childTerm [parentTerm ...]`. Parents are
    /// resolved before the child is registered, so a line naming itself as
    /// its own parent fails with `UnknownParent`.
    pub fn build<I, S>(lines: I, oracle: Arc<dyn SimilarityOracle>) -> Result<Self, TaxonomyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !oracle.ready() {
            return Err(TaxonomyError::OracleNotReady);
        }

        let mut taxonomy = Self {
            domain: DEFAULT_DOMAIN.to_string(),
            nodes: Vec::new(),
            terms: HashMap::new(),
            roots: Vec::new(),
            oracle,
        };

        for (i, text) in lines.into_iter().enumerate() {
            let Some(entry) = parse_line(i + 1, text.as_ref()) else {
                continue;
            };

            if taxonomy.terms.contains_key(entry.term) {
                return Err(TaxonomyError::DuplicateTerm {
                    term: entry.term.to_string(),
                    line: entry.line,
                });
            }

            let parents = entry
                .parents
                .iter()
                .map(|&parent| {
                    taxonomy
                        .terms
                        .get(parent)
                        .copied()
                        .ok_or_else(|| TaxonomyError::UnknownParent {
                            parent: parent.to_string(),
                            child: entry.term.to_string(),
                            line: entry.line,
                        })
                })
                .collect::<Result<Vec<NodeId>, _>>()?;

            let id = taxonomy.nodes.len();
            taxonomy.nodes.push(ConceptNode::new(id, entry.term));
            taxonomy.terms.insert(entry.term.to_string(), id);

            if parents.is_empty() {
                taxonomy.roots.push(id);
            } else {
                for parent in parents {
                    taxonomy.nodes[parent].add_child(id);
                }
            }
        }

        debug!(
            nodes = taxonomy.nodes.len(),
            roots = taxonomy.roots.len(),
            "Built taxonomy"
        );

        Ok(taxonomy)
    }

    /// Read a UTF-8 listing file and build a taxonomy from it.
    pub fn from_file(path: &Path, oracle: Arc<dyn SimilarityOracle>) -> Result<Self, TaxonomyError> {
        if !oracle.ready() {
            return Err(TaxonomyError::OracleNotReady);
        }

        let text = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let taxonomy = Self::build(text.lines(), oracle)?;

        info!(
            path = %path.display(),
            rules = taxonomy.len(),
            roots = taxonomy.roots.len(),
            "Loaded taxonomy"
        );

        Ok(taxonomy)
    }

    /// Attach a domain label (defaults to "general").
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Number of concepts (rules) in the taxonomy.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    /// Look up a concept by its term.
    pub fn get(&self, term: &str) -> Option<&ConceptNode> {
        self.terms.get(term).map(|&id| &self.nodes[id])
    }

    /// Root ids in listing order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn root_nodes(&self) -> impl Iterator<Item = &ConceptNode> + '_ {
        self.roots.iter().map(|&id| &self.nodes[id])
    }

    /// Children of a node in listing order.
    pub fn children<'a>(&'a self, node: &'a ConceptNode) -> impl Iterator<Item = &'a ConceptNode> + 'a {
        node.children().iter().map(|&id| &self.nodes[id])
    }

    pub fn oracle(&self) -> &dyn SimilarityOracle {
        self.oracle.as_ref()
    }

    /// Score a single concept against a sentence with this taxonomy's oracle.
    pub fn score<S: AsRef<str>>(&self, node: &ConceptNode, sentence: &[S], threshold: f64) -> MatchResult {
        node.score(self.oracle.as_ref(), sentence, threshold)
    }

    pub fn stats(&self) -> TaxonomyStats {
        // Children always have larger ids than their parents, so a reverse
        // sweep sees every child's depth before its parent's.
        let mut depth = vec![1usize; self.nodes.len()];
        for node in self.nodes.iter().rev() {
            if let Some(deepest) = node.children().iter().map(|&c| depth[c]).max() {
                depth[node.id()] = deepest + 1;
            }
        }

        TaxonomyStats {
            nodes: self.nodes.len(),
            roots: self.roots.len(),
            leaves: self.nodes.iter().filter(|n| n.is_leaf()).count(),
            max_depth: self.roots.iter().map(|&r| depth[r]).max().unwrap_or(0),
        }
    }

    /// Depth-first walk from the roots, yielding (depth, node) pairs with
    /// roots at depth 0. Shared nodes appear once under each parent.
    pub fn walk(&self) -> Vec<(usize, &ConceptNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|&id| (0, id)).collect();

        while let Some((depth, id)) = stack.pop() {
            let node = &self.nodes[id];
            out.push((depth, node));
            stack.extend(node.children().iter().rev().map(|&c| (depth + 1, c)));
        }

        out
    }
}

impl fmt::Debug for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Taxonomy")
            .field("domain", &self.domain)
            .field("nodes", &self.nodes)
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "There are {} rules in the rulebase ({}):",
            self.len(),
            self.domain
        )?;
        writeln!(f, "-------")?;
        for (depth, node) in self.walk() {
            writeln!(f, "{}{}", "  ".repeat(depth), node.term())?;
        }
        Ok(())
    }
}
