// Concept taxonomy: listing parser, node scoring, and the arena-backed forest.

pub mod listing;
pub mod node;
pub mod tree;
