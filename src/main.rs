use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use rulebase::config::{Config, ModelFormat};
use rulebase::matcher::descent::{MatchOptions, Matcher};
use rulebase::oracle::traits::SimilarityOracle;
use rulebase::oracle::word2vec::WordVectors;
use rulebase::taxonomy::tree::Taxonomy;

/// Rulebase: hierarchical text classification.
///
/// Descends a concept taxonomy from the roots to a leaf, at each level
/// picking the concept most similar to some word of the sentence.
#[derive(Parser)]
#[command(name = "rulebase", version, about)]
struct Cli {
    /// word2vec model file (overrides RULEBASE_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Read the model in word2vec text format instead of binary
    #[arg(long, global = true)]
    text_model: bool,

    /// Taxonomy listing file (overrides RULEBASE_TAXONOMY_PATH)
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one sentence given as separate words
    Classify {
        /// The sentence, already split into words
        #[arg(trailing_var_arg = true)]
        words: Vec<String>,

        /// Ignore similarities at or below this value
        #[arg(long)]
        threshold: Option<f64>,

        /// Reserved; the full leaf-level ranking is always reported
        #[arg(long, default_value = "1")]
        topk: usize,

        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a file of sentences (one per line) into JSON lines
    Batch {
        /// Input file, one whitespace-separated sentence per line
        input: PathBuf,

        /// Write JSON lines here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of sentences to classify in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Ignore similarities at or below this value
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Print the taxonomy tree
    Tree,

    /// Look up the similarity between a concept term and a word
    Similarity { term: String, word: String },

    /// Show model and taxonomy status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Structured logging on stderr so stdout stays clean for JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rulebase=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if cli.text_model {
        config.model_format = ModelFormat::Text;
    }
    if let Some(taxonomy) = cli.taxonomy {
        config.taxonomy_path = taxonomy;
    }

    match cli.command {
        Commands::Classify {
            words,
            threshold,
            topk,
            json,
        } => {
            let taxonomy = load_rulebase(&config)?;
            let options = MatchOptions {
                topk,
                threshold: threshold.unwrap_or(config.threshold),
            };

            let classification = Matcher::with_options(&taxonomy, options).classify(&words)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&classification)?);
            } else {
                rulebase::output::terminal::display_classification(&words, &classification);
            }
        }

        Commands::Batch {
            input,
            output,
            concurrency,
            threshold,
        } => {
            let taxonomy = Arc::new(load_rulebase(&config)?);
            let options = MatchOptions {
                threshold: threshold.unwrap_or(config.threshold),
                ..MatchOptions::default()
            };

            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read batch input {}", input.display()))?;
            let sentences = rulebase::pipeline::batch::read_sentences(&text);
            info!(
                sentences = sentences.len(),
                concurrency, "Starting batch classification"
            );

            let records =
                rulebase::pipeline::batch::classify_all(taxonomy, options, sentences, concurrency)
                    .await?;

            let summary = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let summary = rulebase::pipeline::batch::write_records(records, BufWriter::new(file))?;
                    eprintln!(
                        "{}",
                        format!("Results written to: {}", path.display()).bold()
                    );
                    summary
                }
                None => rulebase::pipeline::batch::write_records(records, io::stdout().lock())?,
            };

            eprintln!("\n{}", "Batch complete.".bold());
            eprintln!("  Sentences classified: {}", summary.classified);
            if summary.failed > 0 {
                eprintln!("  {} {}", "Failed:".yellow(), summary.failed);
            }
        }

        Commands::Tree => {
            let taxonomy = load_rulebase(&config)?;
            rulebase::output::terminal::display_taxonomy(&taxonomy);
            rulebase::output::terminal::display_stats(&taxonomy.stats());
        }

        Commands::Similarity { term, word } => {
            let oracle = load_oracle(&config)?;
            match oracle.similarity(&term, &word) {
                Ok(sim) => println!("similarity({term}, {word}) = {sim:.4}"),
                Err(miss) => println!("{} {miss}", "No score:".yellow()),
            }
        }

        Commands::Status => {
            // Load what we can; status reports missing pieces instead of failing
            let oracle = match load_oracle(&config) {
                Ok(oracle) => Some(oracle),
                Err(e) => {
                    warn!("Model unavailable: {e:#}");
                    None
                }
            };
            let taxonomy = match (&oracle, config.require_taxonomy()) {
                (Some(oracle), Ok(())) => match load_taxonomy(&config, Arc::clone(oracle)) {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!("Taxonomy unavailable: {e:#}");
                        None
                    }
                },
                _ => None,
            };

            rulebase::status::show(&config, oracle.as_deref(), taxonomy.as_ref());
        }
    }

    Ok(())
}

/// Load the similarity model in the configured format.
fn load_oracle(config: &Config) -> Result<Arc<dyn SimilarityOracle>> {
    config.require_model()?;
    let path = &config.model_path;
    let vectors = match config.model_format {
        ModelFormat::Binary => WordVectors::load(path),
        ModelFormat::Text => WordVectors::load_text(path),
    }
    .with_context(|| format!("Failed to load word2vec model from {}", path.display()))?;
    Ok(Arc::new(vectors))
}

/// Build the taxonomy against an already-loaded oracle.
fn load_taxonomy(config: &Config, oracle: Arc<dyn SimilarityOracle>) -> Result<Taxonomy> {
    config.require_taxonomy()?;
    let taxonomy = Taxonomy::from_file(&config.taxonomy_path, oracle)?.with_domain(config.domain.clone());
    Ok(taxonomy)
}

/// Model first, then taxonomy: the listing cannot be built without a ready oracle.
fn load_rulebase(config: &Config) -> Result<Taxonomy> {
    let oracle = load_oracle(config)?;
    load_taxonomy(config, oracle)
}
