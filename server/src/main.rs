use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::EngineConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use server::{build_app, ServerConfig};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Index snapshot written by the indexer
    #[arg(long, default_value = "./data/iitable.json")]
    snapshot: PathBuf,
    /// Directory holding the indexed documents (used for excerpts and as the search universe)
    #[arg(long, default_value = "./data/news")]
    docs: PathBuf,
    /// Engine config file (JSON); must match the tokenizer settings used at build time
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reject unbalanced boolean queries
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let mut engine = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    engine.strict_boolean |= args.strict;

    let app: Router = build_app(ServerConfig { snapshot: args.snapshot, docs: args.docs, engine })?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
