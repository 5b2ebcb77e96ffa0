// Batch classification pipeline: read sentences -> classify -> JSON lines.
//
// Each input line is one sentence, split on whitespace. Matching is pure
// CPU work over an immutable taxonomy, so sentences are classified on
// tokio's blocking pool with a bounded number in flight. `buffered` (not
// `buffer_unordered`) keeps the output in input order.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::matcher::descent::{MatchOptions, Matcher};
use crate::taxonomy::node::MatchResult;
use crate::taxonomy::tree::Taxonomy;

/// One input sentence and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// 1-based line number in the input
    pub line: usize,
    pub words: Vec<String>,
}

/// One classified sentence, written as a JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub line: usize,
    pub sentence: Vec<String>,
    /// Rendered descent trace, e.g. "Purchase>"
    pub trace: String,
    pub results: Vec<MatchResult>,
}

/// Counts reported after a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub classified: usize,
    pub failed: usize,
}

/// Split batch input into sentences. Blank lines are skipped.
pub fn read_sentences(input: &str) -> Vec<Sentence> {
    input
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            (!words.is_empty()).then_some(Sentence { line: i + 1, words })
        })
        .collect()
}

/// Classify every sentence, at most `concurrency` at a time.
///
/// Returns one result per sentence, in input order. A failure on one
/// sentence does not stop the others.
pub async fn classify_all(
    taxonomy: Arc<Taxonomy>,
    options: MatchOptions,
    sentences: Vec<Sentence>,
    concurrency: usize,
) -> Result<Vec<Result<BatchRecord>>> {
    let pb = ProgressBar::new(sentences.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Classifying [{bar:30}] {pos}/{len} ({eta})")
            .context("Invalid progress bar template")?,
    );

    let results: Vec<Result<BatchRecord>> = stream::iter(sentences.into_iter().map(|sentence| {
        let taxonomy = Arc::clone(&taxonomy);
        let pb = pb.clone();
        async move {
            let line = sentence.line;
            let record = tokio::task::spawn_blocking(move || classify_one(&taxonomy, options, sentence))
                .await
                .with_context(|| format!("Classification task for line {line} panicked"))
                .and_then(|r| r);
            pb.inc(1);
            record
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    pb.finish_and_clear();
    Ok(results)
}

/// Write successful records as JSON lines; log and count failures.
pub fn write_records<W: Write>(records: Vec<Result<BatchRecord>>, mut out: W) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for record in records {
        match record {
            Ok(record) => {
                serde_json::to_writer(&mut out, &record)?;
                out.write_all(b"\n")?;
                summary.classified += 1;
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to classify sentence, skipping");
                summary.failed += 1;
            }
        }
    }

    out.flush()?;
    info!(
        classified = summary.classified,
        failed = summary.failed,
        "Batch classification complete"
    );
    Ok(summary)
}

fn classify_one(taxonomy: &Taxonomy, options: MatchOptions, sentence: Sentence) -> Result<BatchRecord> {
    let classification = Matcher::with_options(taxonomy, options)
        .classify(&sentence.words)
        .with_context(|| format!("Line {}", sentence.line))?;

    Ok(BatchRecord {
        line: sentence.line,
        trace: classification.trace.to_string(),
        results: classification.results,
        sentence: sentence.words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sentences_skips_blank_lines() {
        let sentences = read_sentences("I bought coffee\n\n  \nhello there\n");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].line, 1);
        assert_eq!(sentences[0].words, vec!["I", "bought", "coffee"]);
        assert_eq!(sentences[1].line, 4);
    }

    #[test]
    fn test_write_records_counts_failures() {
        let records = vec![
            Ok(BatchRecord {
                line: 1,
                sentence: vec!["coffee".to_string()],
                trace: "Purchase>".to_string(),
                results: vec![MatchResult {
                    score: 0.9,
                    term: "Drinks".to_string(),
                    matched_word: "coffee".to_string(),
                }],
            }),
            Err(anyhow::anyhow!("boom")),
        ];
        let mut out = Vec::new();
        let summary = write_records(records, &mut out).unwrap();
        assert_eq!(summary, BatchSummary { classified: 1, failed: 1 });

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["trace"], "Purchase>");
        assert_eq!(value["results"][0]["matched_word"], "coffee");
    }
}
