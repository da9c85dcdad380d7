//! # Askfolio
//!
//! Retrieval-augmented Q&A service for a personal portfolio site.
//!
//! Usage:
//!   askfolio                          # Start the gateway (default)
//!   askfolio serve --port 8080        # Custom port
//!   askfolio ask "What are dogs?"     # One-shot knowledge question
//!   askfolio resume cv.txt "skills?"  # One-shot resume question

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use askfolio_core::config::AskfolioConfig;
use askfolio_gateway::AskPipeline;

#[derive(Parser)]
#[command(
    name = "askfolio",
    version,
    about = "Retrieval-augmented Q&A service for a personal portfolio site"
)]
struct Cli {
    /// Config file path (defaults to ~/.askfolio/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer one question from the knowledge file and exit
    Ask { question: String },
    /// Answer one question from a resume document and exit
    Resume { file: String, question: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "askfolio=debug,tower_http=debug"
    } else {
        "askfolio=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let expanded = PathBuf::from(shellexpand::tilde(path).to_string());
            AskfolioConfig::load_from(&expanded)?
        }
        None => AskfolioConfig::load()?,
    };

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            askfolio_gateway::start(&config).await
        }
        Command::Ask { question } => {
            config.mode = "knowledge".into();
            let state = askfolio_gateway::build_state(&config)?;
            let AskPipeline::Knowledge(retriever) = &state.pipeline else {
                unreachable!("knowledge mode builds a knowledge pipeline");
            };
            println!("{}", retriever.answer(&question).await?);
            Ok(())
        }
        Command::Resume { file, question } => {
            config.mode = "resume".into();
            config.resume.path = shellexpand::tilde(&file).to_string();
            let state = askfolio_gateway::build_state(&config)?;
            let AskPipeline::Resume { engine, backend } = &state.pipeline else {
                unreachable!("resume mode builds a resume pipeline");
            };
            let answer =
                askfolio_gateway::routes::answer_resume(engine, backend.as_deref(), &question)
                    .await?;
            println!("{answer}");
            Ok(())
        }
    }
}
