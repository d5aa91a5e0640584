//! shiplabel-ingest - shipping-label address ingest
//!
//! Serves the HTTP API (`serve`) or runs one pipeline operation from the
//! command line. Every subcommand resolves the root folder, loads
//! `<root>/shiplabel.toml` and opens `<root>/shiplabel.db`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shiplabel_common::config::{self, TomlConfig, ROOT_FOLDER_ENV};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shiplabel_ingest::db::migrations::{stamp_all_dates, StampOutcome};
use shiplabel_ingest::db::SqliteAddressStore;
use shiplabel_ingest::models::{ImportInput, SourceKind};
use shiplabel_ingest::AppState;

/// Command-line arguments for shiplabel-ingest
#[derive(Parser, Debug)]
#[command(name = "shiplabel-ingest")]
#[command(about = "Shipping-label address ingest")]
#[command(version)]
struct Cli {
    /// Folder holding shiplabel.toml and shiplabel.db
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (reconciles duplicates once at startup)
    Serve {
        /// Port to listen on (overrides shiplabel.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Import one file as a single batch
    Import {
        /// pdf, spreadsheet or text
        #[arg(short, long)]
        kind: SourceKind,

        file: PathBuf,
    },

    /// Delete older duplicates, keeping the newest record per address
    Reconcile,

    /// Print stored records, newest first, as JSON lines
    List {
        /// Case-insensitive filter over every field
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Overwrite the date of every stored record (one-time migration)
    StampDates {
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Run even if already applied
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref(), ROOT_FOLDER_ENV);
    let toml_config = TomlConfig::load(&config::config_path(&root_folder))
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        build_profile = env!("BUILD_PROFILE"),
        "shiplabel-ingest starting"
    );
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    let pool = shiplabel_ingest::db::init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database: {}", db_path.display());

    match cli.command {
        Command::Serve { port } => {
            let state = AppState::from_pool(pool, &toml_config).await?;
            serve(state, port.unwrap_or(toml_config.port)).await
        }
        Command::Import { kind, file } => {
            let state = AppState::from_pool(pool, &toml_config).await?;
            import_file(&state, kind, &file).await
        }
        Command::Reconcile => {
            let state = AppState::from_pool(pool, &toml_config).await?;
            let report = state.reconciler.reconcile().await?;
            println!("removed {} duplicate(s), {} record(s) remain", report.removed, report.remaining);
            Ok(())
        }
        Command::List { query } => {
            let state = AppState::from_pool(pool, &toml_config).await?;
            let book = state.coordinator.book();
            let records = match query.as_deref() {
                Some(q) => book.search(q).await,
                None => book.records().await,
            };
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
            Ok(())
        }
        Command::StampDates { date, force } => {
            let store = SqliteAddressStore::new(pool);
            match stamp_all_dates(&store, date, force).await? {
                StampOutcome::Applied { date, updated } => {
                    println!("stamped {} record(s) with {}", updated, date);
                }
                StampOutcome::AlreadyApplied { previous } => {
                    println!("already applied ({}); use --force to run again", previous);
                }
            }
            Ok(())
        }
    }
}

async fn serve(state: AppState, port: u16) -> Result<()> {
    match state.reconciler.reconcile().await {
        Ok(report) => info!(
            removed = report.removed,
            remaining = report.remaining,
            "Startup reconciliation complete"
        ),
        Err(e) => warn!("Startup reconciliation failed: {}", e),
    }

    let shutdown = state.shutdown.clone();
    let app = shiplabel_ingest::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn import_file(state: &AppState, kind: SourceKind, file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = state
        .coordinator
        .import_batch(ImportInput::from_bytes(kind, bytes), &cancel)
        .await
        .with_context(|| format!("Import of {} failed", file.display()))?;

    println!(
        "imported {} record(s), {} stored",
        outcome.inserted,
        outcome.records.len()
    );
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
