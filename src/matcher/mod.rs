// Greedy top-down matching over a taxonomy.

pub mod descent;
pub mod trace;
