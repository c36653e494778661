#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use counsel_config::{Config, HistoryBackend};
use counsel_conversation::Orchestrator;
use counsel_core::{HistoryProvider, MessageStore};
use counsel_http::AppState;
use counsel_providers::OpenAiGateway;
use counsel_store::{MemoryHistory, SqlHistory, SqlMessageStore};
use sea_orm::Database;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "counsel")]
#[command(about = "counsel legal advisor chatbot backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP backend
    Serve {
        /// Bind address override, e.g. 127.0.0.1:8000
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

async fn serve(bind_override: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    info!("Loaded config from ~/counsel/config.json");

    if let Some(bind) = bind_override {
        config.server.bind = bind;
    }

    let db = Database::connect(&config.database.url).await?;
    info!("Connected to database");

    let store: Arc<dyn MessageStore> = Arc::new(SqlMessageStore::new(db.clone()).await?);
    let history: Arc<dyn HistoryProvider> = match config.chat.history {
        HistoryBackend::Durable => Arc::new(SqlHistory::new(db).await?),
        HistoryBackend::Memory => {
            info!("Using process-local history; context will not survive restarts");
            Arc::new(MemoryHistory::new())
        }
    };

    let gateway = OpenAiGateway::new(
        config.provider.api_key.clone(),
        config.provider.model.clone(),
    )
    .with_base_url(config.provider.base_url.clone())
    .with_temperature(config.provider.temperature)
    .with_timeout(Duration::from_secs(config.provider.timeout_secs));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(gateway),
        history,
        store.clone(),
        config.chat.system_prompt.clone(),
    ));

    let app = counsel_http::router(AppState {
        orchestrator,
        store,
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Listening on {}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => serve(bind).await?,
        Commands::Init => {
            Config::create_config()?;
        }
        Commands::Version => {
            println!("counsel {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
