// System status display: model file, vocabulary, and taxonomy shape.

use std::path::Path;

use crate::config::Config;
use crate::oracle::traits::SimilarityOracle;
use crate::output::terminal::display_stats;
use crate::taxonomy::tree::Taxonomy;

/// Display system status to the terminal.
///
/// `oracle` and `taxonomy` are whatever could be loaded; missing pieces are
/// reported with the command that would fix them.
pub fn show(config: &Config, oracle: Option<&dyn SimilarityOracle>, taxonomy: Option<&Taxonomy>) {
    // Model file
    let model_path = &config.model_path;
    match file_size(model_path) {
        Some(size) => println!("Model: {} ({}, {:?})", model_path.display(), size, config.model_format),
        None => {
            println!("Model: not found at {}", model_path.display());
            println!("  Set RULEBASE_MODEL_PATH or pass --model");
        }
    }

    match oracle {
        Some(oracle) if oracle.ready() => {
            let dims = oracle
                .dimensions()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("Vocabulary: {} words, {} dimensions", oracle.vocab_size(), dims);
        }
        Some(_) => println!("Vocabulary: model loaded but empty"),
        None => println!("Vocabulary: model not loaded"),
    }

    // Taxonomy listing
    let taxonomy_path = &config.taxonomy_path;
    match file_size(taxonomy_path) {
        Some(size) => println!("Listing: {} ({})", taxonomy_path.display(), size),
        None => {
            println!("Listing: not found at {}", taxonomy_path.display());
            println!("  Set RULEBASE_TAXONOMY_PATH or pass --taxonomy");
        }
    }

    match taxonomy {
        Some(taxonomy) => {
            println!("Domain: {}", taxonomy.domain());
            display_stats(&taxonomy.stats());
        }
        None => println!("Taxonomy: not loaded"),
    }

    println!("Default threshold: {}", config.threshold);
}

fn file_size(path: &Path) -> Option<String> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| format_bytes(m.len()))
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
