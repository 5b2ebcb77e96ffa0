// Taxonomy listing format.
//
// One concept per line, whitespace-separated:
//
//   childTerm [parentTerm ...]
//
// A line with no parents declares a root. Parents must be declared on an
// earlier line. Blank lines are ignored and do not consume a node id.

/// A single parsed line of a taxonomy listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry<'a> {
    /// 1-based line number in the source listing
    pub line: usize,
    pub term: &'a str,
    /// Parent terms in listing order, duplicates removed
    pub parents: Vec<&'a str>,
}

impl ListingEntry<'_> {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Parse one listing line. Returns `None` for blank lines.
pub fn parse_line(line: usize, text: &str) -> Option<ListingEntry<'_>> {
    let mut tokens = text.split_whitespace();
    let term = tokens.next()?;

    let mut parents: Vec<&str> = Vec::new();
    for parent in tokens {
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    Some(ListingEntry {
        line,
        term,
        parents,
    })
}
