mod app;
mod config;
mod error;
mod ingest;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use storage::{LogStore, SchemaStatus, SqliteLogStore, TagId};
use tracing_subscriber::EnvFilter;

use app::AppState;
use config::Config;
use error::Result;
use ingest::SystemClock;

const CONFIG_FILE: &str = "rfidlog.toml";
const DEFAULT_LOG_FILTER: &str = "rfidlog=info,storage=info,tower_http=info";

#[derive(Parser)]
#[command(name = "rfidlog")]
#[command(about = "Access log for RFID tag events", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Database path (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the ingestion endpoint and the log page
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Create the log table if it does not exist
    InitDb,
    /// Print the log to the terminal
    Log {
        /// Only show events for this tag
        #[arg(short, long)]
        tag: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(db) = cli.db {
        config.storage.path = db;
    }
    let store =
        SqliteLogStore::new(&config.storage.path).with_busy_timeout(config.busy_timeout());

    match cli.command {
        Some(Commands::Serve { listen }) => cmd_serve(config, store, listen).await,
        None => cmd_serve(config, store, None).await,
        Some(Commands::InitDb) => cmd_init_db(store).await,
        Some(Commands::Log { tag }) => cmd_log(store, tag.map(TagId)).await,
    }
}

async fn cmd_serve(config: Config, store: SqliteLogStore, listen: Option<String>) -> Result<()> {
    let store = Arc::new(store);
    let init = Arc::clone(&store);
    tokio::task::spawn_blocking(move || init.initialize_schema()).await??;

    let addr = listen.unwrap_or_else(|| config.server.listen.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        db = %store.path().display(),
        clock_offset_secs = config.ingest.clock_offset_secs,
        "rfidlog listening"
    );

    let app = app::router(AppState {
        store,
        clock: Arc::new(SystemClock),
        clock_offset: config.clock_offset(),
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("rfidlog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn cmd_init_db(store: SqliteLogStore) -> Result<()> {
    let path = store.path().to_path_buf();
    let status = tokio::task::spawn_blocking(move || store.initialize_schema()).await??;
    println!("{}", init_message(status, &path));
    Ok(())
}

fn init_message(status: SchemaStatus, path: &Path) -> String {
    match status {
        SchemaStatus::Created => format!("Log created at {}", path.display()),
        SchemaStatus::AlreadyExists => {
            format!("Log already exists at {}; nothing changed", path.display())
        }
    }
}

async fn cmd_log(store: SqliteLogStore, tag: Option<TagId>) -> Result<()> {
    let records = tokio::task::spawn_blocking(move || ingest::read_log(&store)).await??;

    let mut shown = 0;
    for stored in records
        .iter()
        .filter(|stored| tag.is_none_or(|tag| stored.record.tag == tag))
    {
        let (text, _) = stored.record.kind.describe();
        let time = stored
            .record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        let text = if text.is_empty() {
            format!("event {}", stored.record.kind.code())
        } else {
            text.to_string()
        };
        println!("{:>6}  [{time}]  {:<12}  {text}", stored.seq, stored.record.tag);
        shown += 1;
    }

    if shown == 0 {
        println!("No events found.");
    }
    Ok(())
}
