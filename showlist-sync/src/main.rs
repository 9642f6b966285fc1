//! showlist-sync - live music listing sync
//!
//! Runs sync passes, inspects and administers the event table, and serves
//! the read-only listing API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showlist_common::config::{database_path, load_or_default, resolve_root_folder};
use showlist_common::db::init_database;
use showlist_common::time::{format_iso_date, today};
use showlist_sync::config::SyncSettings;
use showlist_sync::db::{events, runs};
use showlist_sync::services::SyncOrchestrator;
use showlist_sync::sources::HttpPageFetcher;
use showlist_sync::{build_router, AppState, SyncError};

/// Command-line arguments for showlist-sync
#[derive(Parser, Debug)]
#[command(name = "showlist-sync")]
#[command(about = "Aggregate, deduplicate and serve live music listings")]
#[command(version)]
struct Args {
    /// Config file (default: SHOWLIST_CONFIG, then the per-user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding showlist.db (default: SHOWLIST_ROOT_FOLDER, config, OS data dir)
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one sync pass
    Run,

    /// Print upcoming events
    List,

    /// Print recent sync passes
    Runs {
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },

    /// Delete one event by identity key
    Delete {
        identity_key: String,
    },

    /// Delete every stored event
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Serve the read-only HTTP API
    Serve {
        #[arg(short, long, default_value = "5780", env = "SHOWLIST_PORT")]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    let default_filter = format!(
        "showlist_sync={level},showlist_common={level},tower_http=info",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("showlist-sync {}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match args.command {
        Command::Run => {
            let settings = SyncSettings::resolve(&config);
            let fetcher = HttpPageFetcher::new(&settings.user_agent, settings.http_timeout)
                .context("Failed to build HTTP client")?;
            let orchestrator = SyncOrchestrator::from_settings(pool, &settings, Arc::new(fetcher));

            match orchestrator.run_pass(today()).await {
                Ok(summary) => println!("{}", summary.display_string()),
                Err(SyncError::RunInProgress(holder)) => {
                    bail!("Another sync pass is running (lock held by {})", holder)
                }
                Err(e) => return Err(e).context("Sync pass failed"),
            }
        }

        Command::List => {
            let upcoming = events::list_upcoming(&pool, today())
                .await
                .context("Failed to list events")?;
            for event in &upcoming {
                println!(
                    "{}  {:<28}  {}{}",
                    format_iso_date(event.event_date),
                    event.venue_name,
                    event.display_name,
                    event.ticket_url.as_deref().map(|u| format!("  <{}>", u)).unwrap_or_default()
                );
            }
            println!("{} upcoming events", upcoming.len());
        }

        Command::Runs { limit } => {
            for run in runs::recent_runs(&pool, limit).await.context("Failed to read run log")? {
                let detail = match (&run.summary, &run.error) {
                    (Some(summary), _) => summary.display_string(),
                    (None, Some(error)) => error.clone(),
                    (None, None) => String::new(),
                };
                println!("{}  {:<9}  {}", run.started_at.format("%Y-%m-%d %H:%M:%S"), run.status, detail);
            }
        }

        Command::Delete { identity_key } => {
            if !events::delete_event(&pool, &identity_key)
                .await
                .context("Failed to delete event")?
            {
                bail!("No event with identity key '{}'", identity_key);
            }
            info!(identity_key = %identity_key, "Deleted event");
            println!("Deleted {}", identity_key);
        }

        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to delete all events without --yes");
            }
            let deleted = events::delete_all(&pool).await.context("Failed to reset events")?;
            info!(deleted, "Deleted all events");
            println!("Deleted {} events", deleted);
        }

        Command::Serve { port, bind } => {
            let addr: SocketAddr = format!("{}:{}", bind, port)
                .parse()
                .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

            let app = build_router(AppState::new(pool));
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind to {}", addr))?;

            info!("Listening on http://{}", addr);
            info!("Health check: http://{}/health", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;

            info!("Server shutdown complete");
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
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
