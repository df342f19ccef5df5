//! Strata - entity-linking indexer for Substrate block extracts.
//!
//! # Usage
//!
//! ```bash
//! # Dry run into memory
//! strata --input blocks.jsonl
//!
//! # Persist to PostgreSQL, resuming at block 1000
//! DATABASE_URL=postgres://localhost/strata strata --input blocks.jsonl --from-height 1000
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use strata_core::error::IndexerError;
use strata_core::metrics::init_metrics;
use strata_core::ports::Store;
use strata_core::services::{IndexerConfig, IndexerService};
use strata_source::JsonLinesSource;
use strata_storage::{Database, DatabaseConfig, MemoryStore, PgStore};

/// Strata CLI - links block extracts into a relational entity graph.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Strata - entity-linking indexer for Substrate block extracts")]
#[command(version)]
struct Cli {
    /// Block extract file, one JSON document per line.
    #[arg(long, env = "INPUT")]
    input: Option<PathBuf>,

    /// PostgreSQL database URL. Entities are kept in memory when unset.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// First block height to index.
    #[arg(long, env = "FROM_HEIGHT", default_value = "0")]
    from_height: u64,

    /// Flush the store after this many blocks.
    #[arg(long, env = "FLUSH_EVERY", default_value = "100")]
    flush_every: u32,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Purge all indexed data from the database and exit.
    ///
    /// This will delete all blocks, extrinsics, calls and events.
    /// Schema/migrations are preserved.
    #[arg(long)]
    purge: bool,

    /// Skip confirmation prompt for destructive operations (like --purge).
    #[arg(long, short = 'y')]
    yes: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Strata Indexer");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ STORE
    // ─────────────────────────────────────────────────────────────────────────
    let (store, db): (Arc<dyn Store>, Option<Database>) = match cli.database_url.as_deref() {
        Some(database_url) => {
            debug!(database_url = %mask_password(database_url), "Database endpoint");

            info!("🗄️  Connecting to database...");
            let db = Database::connect(&DatabaseConfig::new(database_url))
                .await
                .context("Failed to connect to database")?;

            db.migrate().await.context("Failed to run migrations")?;
            info!("🗄️  Database ready (migrations applied)");

            if cli.migrate_only {
                info!("🛑 --migrate-only flag set, exiting");
                return Ok(());
            }

            if cli.purge {
                return handle_purge(&db, cli.yes).await;
            }

            (Arc::new(PgStore::new(&db)), Some(db))
        }
        None => {
            if cli.migrate_only || cli.purge {
                bail!("--migrate-only and --purge require DATABASE_URL");
            }
            warn!("⚠️  DATABASE_URL not set, entities are kept in memory only");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 📡 BLOCK SOURCE
    // ─────────────────────────────────────────────────────────────────────────
    let input = cli
        .input
        .context("No block extract file given (--input or INPUT)")?;

    let source = JsonLinesSource::open(&input)
        .await
        .with_context(|| format!("Failed to open {}", input.display()))?;
    info!(path = %input.display(), "📡 Block source ready");

    let indexer_config = IndexerConfig {
        start_height: cli.from_height,
        flush_every: cli.flush_every,
    };
    let indexer = IndexerService::new(indexer_config, Arc::new(source), store);

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ INDEXING
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut indexer_handle = tokio::spawn(
        async move { indexer.run(shutdown_rx).await }.instrument(info_span!("indexer")),
    );

    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    let joined = tokio::select! {
        joined = &mut indexer_handle => joined,
        _ = shutdown_signal() => {
            // ─────────────────────────────────────────────────────────────────
            // 🛑 SHUTDOWN
            // ─────────────────────────────────────────────────────────────────
            info!("🛑 Shutting down...");
            let _ = shutdown_tx.send(true);

            match tokio::time::timeout(Duration::from_secs(30), &mut indexer_handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("⚠️  Indexer shutdown timed out");
                    indexer_handle.abort();
                    close(db).await;
                    return Ok(());
                }
            }
        }
    };

    let outcome = joined.context("Indexer task failed")?;
    close(db).await;

    match outcome {
        Ok(stats) => {
            info!(
                blocks = stats.blocks,
                extrinsics = stats.extrinsics,
                calls = stats.calls,
                events = stats.events,
                last = ?stats.last_height,
                "✅ Indexing complete"
            );
            Ok(())
        }
        Err(IndexerError::ShutdownRequested) => {
            info!("🛑 Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "❌ Indexer error");
            Err(e).context("Indexing failed")
        }
    }
}

async fn close(db: Option<Database>) {
    if let Some(db) = db {
        db.close().await;
        debug!("Database closed");
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "⚠️  Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "⚠️  Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Handle the --purge command.
async fn handle_purge(db: &Database, skip_confirmation: bool) -> Result<()> {
    warn!("⚠️  PURGE MODE: This will delete ALL indexed data!");
    warn!("   - All blocks, extrinsics, calls, events");
    warn!("   - Schema and migrations will be preserved");

    if !skip_confirmation {
        print!("\n🔴 Are you sure you want to purge all data? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("❌ Purge cancelled");
            return Ok(());
        }
    }

    info!("🗑️  Purging database...");
    let stats = db.purge().await.context("Failed to purge database")?;

    info!("✅ Database purged successfully");
    info!("   📦 Blocks removed: {}", stats.blocks_removed);
    info!("   📝 Extrinsics removed: {}", stats.extrinsics_removed);
    info!("   📞 Calls removed: {}", stats.calls_removed);
    info!("   📣 Events removed: {}", stats.events_removed);
    info!("   Indexing can restart from the first block");

    Ok(())
}
