use anyhow::Result;
use clap::{Parser, Subcommand};
use plainly_cli::{collect_inputs, load_glossary, read_document, readability_of, simplify_files};
use plainly_core::{ModelRegistry, Orchestrator, Settings, SimplificationLevel};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "plainly")]
#[command(about = "Rewrite legal documents in plain language", long_about = None)]
struct Cli {
    /// Settings file (JSON); PLAINLY_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simplify a document or every text file in a directory
    Simplify {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// basic, intermediate or advanced
        #[arg(long, default_value = "intermediate")]
        level: String,
        /// Extra glossary terms (JSON list or object)
        #[arg(long)]
        glossary: Option<PathBuf>,
        /// Skip the built-in legal dictionary
        #[arg(long, default_value_t = false)]
        no_default_glossary: bool,
        /// Output JSONL file
        #[arg(long)]
        output: PathBuf,
        /// Also write highlighted HTML pages into this directory
        #[arg(long)]
        html: Option<PathBuf>,
        /// Override the simplifier endpoint
        #[arg(long)]
        simplifier_url: Option<String>,
        /// Override the summarizer endpoint
        #[arg(long)]
        summarizer_url: Option<String>,
    },
    /// Print readability scores for a file
    Readability {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print glossary matches for a file
    Annotate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        glossary: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        no_default_glossary: bool,
        /// Print highlighted HTML instead of JSON spans
        #[arg(long, default_value_t = false)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simplify {
            input,
            level,
            glossary,
            no_default_glossary,
            output,
            html,
            simplifier_url,
            summarizer_url,
        } => {
            let level: SimplificationLevel = level.parse()?;
            let mut settings = Settings::load(cli.config.as_deref())?;
            if let Some(url) = simplifier_url {
                settings.models.simplifier.endpoint = url;
            }
            if let Some(url) = summarizer_url {
                settings.models.summarizer.endpoint = url;
            }

            let registry = ModelRegistry::from_settings(&settings.models)?;
            if !registry.warm_up().await {
                tracing::warn!("continuing without every model backend; affected stages will fall back");
            }
            let orchestrator = Orchestrator::new(&registry, &settings);
            let glossary = Arc::new(load_glossary(glossary.as_deref(), !no_default_glossary)?);
            let files = collect_inputs(&input)?;
            tracing::info!(files = files.len(), %level, "simplifying");

            let summary = simplify_files(&orchestrator, &files, level, glossary, &output, html.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Readability { input } => {
            let doc = read_document(&input)?;
            println!("{}", serde_json::to_string_pretty(&readability_of(&doc))?);
            Ok(())
        }
        Commands::Annotate { input, glossary, no_default_glossary, html } => {
            let doc = read_document(&input)?;
            let glossary = load_glossary(glossary.as_deref(), !no_default_glossary)?;
            let spans = glossary.annotate(doc.normalized());
            if html {
                println!("{}", plainly_core::render_highlighted(doc.normalized(), &spans));
            } else {
                println!("{}", serde_json::to_string_pretty(&spans)?);
            }
            Ok(())
        }
    }
}
