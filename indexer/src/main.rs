use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::persist::{load_snapshot, meta_path, save_meta, MetaFile, SNAPSHOT_VERSION};
use search_core::config::TokenizerKind;
use search_core::{EngineConfig, SearchEngine};
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect the TF-IDF inverted index snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every file in a directory and write a snapshot
    Build {
        /// Directory of documents; each file stem becomes a document id
        #[arg(long)]
        input: PathBuf,
        /// Snapshot path (`.bin` for bincode, anything else for JSON)
        #[arg(long, default_value = "./data/iitable.json")]
        output: PathBuf,
        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Enable English stemming
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Drop English stopwords
        #[arg(long, default_value_t = false)]
        stopwords: bool,
        /// Segment Chinese text with jieba
        #[arg(long, default_value_t = false)]
        jieba: bool,
    },
    /// Print the statistics stored for one term
    Inspect {
        #[arg(long, default_value = "./data/iitable.json")]
        snapshot: PathBuf,
        #[arg(long)]
        term: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config, stem, stopwords, jieba } => {
            let mut config = match config {
                Some(path) => EngineConfig::load(&path).with_context(|| format!("reading config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            config.tokenizer.stem |= stem;
            config.tokenizer.stopwords |= stopwords;
            if jieba {
                config.tokenizer.kind = TokenizerKind::Jieba;
            }
            build_index(&input, &output, config)
        }
        Commands::Inspect { snapshot, term } => inspect(&snapshot, &term),
    }
}

fn build_index(input: &Path, output: &Path, config: EngineConfig) -> Result<()> {
    let mut engine = SearchEngine::new(config);
    let num_docs = engine
        .load_documents(input)
        .with_context(|| format!("indexing {}", input.display()))?;
    engine.save_snapshot(output)?;

    let meta = MetaFile {
        num_docs,
        num_terms: engine.index().num_terms(),
        created_at: build_timestamp()?,
        version: SNAPSHOT_VERSION,
    };
    save_meta(&meta_path(output), &meta)?;

    tracing::info!(output = %output.display(), num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

fn build_timestamp() -> Result<String> {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .context("formatting build timestamp")
}

fn inspect(snapshot: &Path, term: &str) -> Result<()> {
    let index = load_snapshot(snapshot).with_context(|| format!("loading {}", snapshot.display()))?;
    let info = index.term_info(term);
    let mut postings: Vec<_> = info.postings.iter().map(|(doc, p)| (doc.clone(), p.term_frequency)).collect();
    postings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let out = serde_json::json!({
        "term": term,
        "freq": info.total_frequency,
        "df": info.document_frequency,
        "num_docs": index.num_docs(),
        "postings": postings
            .iter()
            .map(|(doc, tf)| serde_json::json!({ "doc_id": doc, "tf": tf, "tfidf": index.tfidf(doc, term) }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_timestamp_is_rfc3339() {
        let ts = build_timestamp().unwrap();
        assert!(time::OffsetDateTime::parse(&ts, &time::format_description::well_known::Rfc3339).is_ok());
    }
}
