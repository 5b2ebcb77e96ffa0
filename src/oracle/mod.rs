// Similarity oracle: trait-based abstraction over embedding tables.
//
// The SimilarityOracle trait is the only thing the taxonomy and matcher see.
// WordVectors implements it over a word2vec table loaded from disk.

pub mod traits;
pub mod word2vec;
