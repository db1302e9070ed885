use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use study_assistant_backend::{
    config::{Config, MatcherConfig},
    routes,
    services::{
        dispatcher::Dispatcher,
        gemini::GeminiClient,
        matcher::CorpusMatcher,
        trainer::{self, TrainOutcome},
    },
    state::AppState,
};

#[derive(Parser)]
#[command(name = "study-assistant-backend", about = "Study assistant chat API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Train the matcher if needed, then serve the HTTP API (default).
    Serve,
    /// Train the local matcher store and exit.
    Train {
        /// Retrain even if the store is already trained.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Train { force } => train(force).await,
    }
}

async fn train(force: bool) -> anyhow::Result<()> {
    let matcher = MatcherConfig::from_env()?;
    let outcome = if force {
        trainer::train(&matcher.store_path).await?
    } else {
        trainer::ensure_trained(&matcher.store_path, matcher.min_store_bytes).await?
    };
    report(outcome);
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    report(trainer::ensure_trained(&config.matcher.store_path, config.matcher.min_store_bytes).await?);

    let matcher = CorpusMatcher::open(
        &config.matcher.store_path,
        config.matcher.similarity_threshold,
        config.matcher.default_response.clone(),
    )
    .await?;
    tracing::info!(exchanges = matcher.len(), "matcher loaded");

    let gemini = GeminiClient::new(&config.gemini).context("building Gemini client")?;

    let dispatcher = Dispatcher::new(Arc::new(matcher), Arc::new(gemini), config.apology_response);
    let state = Arc::new(AppState::new(dispatcher));

    let app = routes::create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!("study assistant running at http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn report(outcome: TrainOutcome) {
    match outcome {
        TrainOutcome::AlreadyTrained => tracing::info!("matcher store up to date"),
        TrainOutcome::Trained { exchanges } => tracing::info!(exchanges, "matcher store trained"),
    }
}
