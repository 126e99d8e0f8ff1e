use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lexis_core::corpus::load_corpus;
use lexis_core::tokenizer::normalize;
use lexis_core::{DocId, SearchEngine};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "lexis-indexer")]
#[command(about = "Build a TF-IDF inverted index over a corpus and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Boolean,
    Vector,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print its statistics
    Stats {
        /// Input path (file or directory of .json/.jsonl/.txt)
        #[arg(long)]
        input: String,
    },
    /// Build the index and run one query against it
    Search {
        #[arg(long)]
        input: String,
        #[arg(long)]
        query: String,
        #[arg(long, value_enum, default_value_t = Mode::Vector)]
        mode: Mode,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Show postings, document frequency and idf of a term
    Inspect {
        #[arg(long)]
        input: String,
        /// Raw word; it is normalized to its index term first
        #[arg(long)]
        term: String,
    },
}

#[derive(Serialize)]
struct Hit {
    doc_id: DocId,
    score: f64,
}

fn main() -> Result<()> {
    // stdout carries the JSON result; logs go to stderr.
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input } => {
            let engine = build_engine(&input)?;
            print_json(&engine.statistics())
        }
        Commands::Search { input, query, mode, k } => {
            let engine = build_engine(&input)?;
            let start = std::time::Instant::now();
            let results = match mode {
                Mode::Boolean => engine.search_boolean(&query),
                Mode::Vector => engine.search_vector(&query),
            };
            tracing::info!(
                query = %query,
                ?mode,
                total_hits = results.len(),
                took_ms = start.elapsed().as_millis() as u64,
                "search complete"
            );
            let hits: Vec<Hit> =
                results.into_iter().take(k).map(|(doc_id, score)| Hit { doc_id, score }).collect();
            print_json(&hits)
        }
        Commands::Inspect { input, term } => {
            let engine = build_engine(&input)?;
            let stem = normalize(&term).into_iter().next().unwrap_or_else(|| term.to_lowercase());
            tracing::info!(word = %term, %stem, "inspecting term");
            match engine.inspect_term(&stem) {
                Some(info) => print_json(&info),
                None => anyhow::bail!("term {stem:?} is not in the index"),
            }
        }
    }
}

fn build_engine(input: &str) -> Result<SearchEngine> {
    tracing::info!(input, "loading corpus");
    let start = std::time::Instant::now();
    let corpus = load_corpus(input).with_context(|| format!("loading corpus from {input}"))?;
    tracing::info!(num_docs = corpus.len(), "ingested documents");
    let engine = SearchEngine::new();
    engine.build(&corpus);
    let stats = engine.statistics();
    tracing::info!(
        num_terms = stats.total_terms,
        took_ms = start.elapsed().as_millis() as u64,
        "index ready"
    );
    Ok(engine)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
