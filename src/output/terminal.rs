// Colored terminal output for classifications and taxonomies.
//
// This module handles all terminal-specific formatting: colors, tables,
// score bars. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::matcher::descent::Classification;
use crate::taxonomy::tree::{Taxonomy, TaxonomyStats};

const TERM_WIDTH: usize = 32;

/// Display a classification: the descent path, then the scored leaf-level
/// frontier as a ranked table.
pub fn display_classification(sentence: &[String], classification: &Classification) {
    println!(
        "\n{}",
        format!("=== Classification: \"{}\" ===", sentence.join(" ")).bold()
    );

    let path = classification.path().join(" > ");
    println!("  Path:  {}", path.bright_green().bold());
    println!("  Trace: {}", classification.trace.to_string().dimmed());
    println!();

    println!(
        "  {:>4}  {:<32} {:>7}  {:<20}  {}",
        "Rank".dimmed(),
        "Term".dimmed(),
        "Score".dimmed(),
        "".dimmed(),
        "Matched".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for (i, result) in classification.results.iter().enumerate() {
        let term = super::truncate_chars(&result.term, TERM_WIDTH - 3);
        let matched = if result.matched_word.is_empty() {
            "-".dimmed().to_string()
        } else {
            result.matched_word.normal().to_string()
        };
        let term = if i == 0 {
            term.bold().to_string()
        } else {
            term
        };

        println!(
            "  {:>4}. {:<32} {:>7.3}  {}  {}",
            i + 1,
            term,
            result.score,
            colorize_score(result.score),
            matched,
        );
    }
    println!();
}

/// Display a taxonomy as an indented tree with a summary header.
pub fn display_taxonomy(taxonomy: &Taxonomy) {
    println!(
        "\n{}",
        format!(
            "=== Rulebase '{}' ({} rules) ===",
            taxonomy.domain(),
            taxonomy.len()
        )
        .bold()
    );
    println!();

    for (depth, node) in taxonomy.walk() {
        let indent = "  ".repeat(depth + 1);
        if node.is_leaf() {
            println!("{indent}{}", node.term());
        } else {
            println!(
                "{indent}{} {}",
                node.term().bold(),
                format!("({} children)", node.children().len()).dimmed()
            );
        }
    }
    println!();
}

/// Display taxonomy shape statistics.
pub fn display_stats(stats: &TaxonomyStats) {
    println!(
        "Taxonomy: {} rules, {} roots, {} leaves, max depth {}",
        stats.nodes, stats.roots, stats.leaves, stats.max_depth
    );
}

/// A 20-character bar for a similarity score, colored by strength.
fn colorize_score(score: f64) -> colored::ColoredString {
    let bar_width: usize = 20;
    let filled = (score.clamp(0.0, 1.0) * bar_width as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "=".repeat(filled),
        " ".repeat(bar_width.saturating_sub(filled))
    );

    if score >= 0.6 {
        bar.bright_green()
    } else if score >= 0.3 {
        bar.bright_yellow()
    } else {
        bar.bright_blue()
    }
}
