// Multi-sentence workflows built on top of the matcher.

pub mod batch;
