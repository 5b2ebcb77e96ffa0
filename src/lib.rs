// Rulebase: hierarchical text classification over a concept taxonomy
//
// This is the library root. Each module corresponds to a major subsystem
// of the classification engine.

pub mod config;
pub mod matcher;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod taxonomy;
