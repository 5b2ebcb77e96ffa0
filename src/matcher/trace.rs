// DescentTrace: the path of winning concepts taken during one descent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Winning non-leaf terms from root toward the leaf level, in visit order.
///
/// Rendered as each term followed by `>`, e.g. `Purchase>Drinks>`. The leaf
/// winner itself is not part of the trace; it is the top entry of the
/// results that accompany it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescentTrace {
    terms: Vec<String>,
}

impl DescentTrace {
    pub fn push(&mut self, term: impl Into<String>) {
        self.terms.push(term.into());
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for DescentTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for term in &self.terms {
            write!(f, "{term}>")?;
        }
        Ok(())
    }
}
