use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use plainly_core::{entries_from_json, GlossarySnapshot, ModelRegistry, Orchestrator, Settings};
use plainly_server::build_app;
use plainly_server::glossary_store::GlossaryStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Glossary file laid over the built-in legal dictionary
    #[arg(long)]
    glossary: Option<PathBuf>,
    /// Start from an empty glossary instead of the built-in one
    #[arg(long, default_value_t = false)]
    no_default_glossary: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())?;
    let registry = ModelRegistry::from_settings(&settings.models)?;
    if !registry.warm_up().await {
        tracing::warn!("starting with unreachable model backends; requests will report partial failures");
    }
    let orchestrator = Orchestrator::new(&registry, &settings);

    let mut glossary =
        if args.no_default_glossary { GlossarySnapshot::empty() } else { GlossarySnapshot::legal_defaults() };
    if let Some(path) = &args.glossary {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading glossary {}", path.display()))?;
        glossary = glossary.overlay(entries_from_json(&raw)?);
    }
    tracing::info!(terms = glossary.len(), "glossary ready");

    let app: Router = build_app(orchestrator, GlossaryStore::new(glossary));
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
