//! Offline Queue CLI - inspect and maintain the offline request queue store
//!
//! Composition root: wires the SQLite key-value store, clock and ID ports into
//! one `OfflineQueueService` and runs a single command against it.

mod logging;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use offline_queue_core::application::{shutdown_channel, ExpirySweeper};
use offline_queue_core::port::{KeyValueStore, SystemTimeProvider, TimeProvider, UuidProvider};
use offline_queue_core::{EnqueueRequest, HttpMethod, OfflineQueueService, QueuedRequest};
use offline_queue_infra_sqlite::{create_pool, run_migrations, SqliteKeyValueStore};
use serde_json::Value;
use settings::{hours_to_ms, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::info;

type Queue = OfflineQueueService<Value, Value>;

#[derive(Parser)]
#[command(name = "offline-queue")]
#[command(about = "Offline request queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(long, env = "OFFLINE_QUEUE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides settings)
    #[arg(long)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List pending requests
    List {
        /// Print the raw JSON array instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Queue a request (replaces any pending one with the same method and endpoint)
    Add {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        #[arg(short, long)]
        method: String,

        /// Endpoint path, e.g. /bookings
        #[arg(short, long)]
        endpoint: String,

        /// Request body as JSON
        #[arg(long)]
        data: Option<String>,

        /// Transport config (headers etc.) as JSON
        #[arg(long)]
        config: Option<String>,
    },

    /// Remove a pending request by ID
    Remove {
        /// Request ID
        id: String,
    },

    /// Drop every pending request
    Clear,

    /// Show requests older than the expiry age
    Expired {
        /// Age threshold in hours (default from settings, 7 days)
        #[arg(long)]
        max_age_hours: Option<i64>,
    },

    /// Remove requests older than the expiry age
    Clean {
        /// Age threshold in hours (default from settings, 7 days)
        #[arg(long)]
        max_age_hours: Option<i64>,
    },

    /// Show queue status
    Status,

    /// Periodically remove expired requests until Ctrl+C
    Sweep {
        /// Seconds between sweeps (default from settings)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Age threshold in hours (default from settings, 7 days)
        #[arg(long)]
        max_age_hours: Option<i64>,
    },
}

#[derive(Tabled)]
struct RequestRow {
    id: String,
    method: String,
    endpoint: String,
    queued_at: String,
    age: String,
    body: String,
}

impl RequestRow {
    fn from_request(req: &QueuedRequest, now: i64) -> Self {
        Self {
            id: req.id.clone(),
            method: req.method.to_string(),
            endpoint: req.endpoint.clone(),
            queued_at: format_timestamp(req.timestamp),
            age: format_age(req.age_ms(now)),
            body: if req.data.is_some() { "yes" } else { "-" }.to_string(),
        }
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn format_age(age_ms: i64) -> String {
    let secs = age_ms.max(0) / 1000;
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d {}h", s / 86_400, (s % 86_400) / 3600),
    }
}

fn parse_json(label: &str, raw: Option<String>) -> Result<Option<Value>> {
    raw.map(|s| serde_json::from_str(&s).with_context(|| format!("Invalid JSON {label}")))
        .transpose()
}

fn print_requests(requests: &[QueuedRequest], now: i64) {
    let rows: Vec<_> = requests
        .iter()
        .map(|req| RequestRow::from_request(req, now))
        .collect();
    println!("{}", Table::new(rows));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        settings.db_path = db_path;
    }

    // 2. Initialize logging
    let log_dir = settings.log_dir();
    let _log_guard = logging::init_logging(&settings.log_format, log_dir.as_deref())?;

    // 3. Open the store
    let db_path = settings.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db_url = db_path.to_string_lossy().into_owned();
    info!(db_path = %db_url, "Opening queue store");

    let pool = create_pool(&db_url).await.context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let kv = Arc::new(SqliteKeyValueStore::new(pool, time_provider.clone()));
    let queue_config = settings.queue_config();
    let storage_key = queue_config.storage_key.clone();
    let queue: Queue = OfflineQueueService::new(
        kv.clone() as Arc<dyn KeyValueStore>,
        Arc::new(UuidProvider),
        time_provider.clone(),
        queue_config,
    )?;

    let now = time_provider.now_millis();

    match cli.command {
        Commands::List { json } => {
            let requests = queue.get_queue().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&requests)?);
            } else if requests.is_empty() {
                println!("{}", "Queue is empty".yellow());
            } else {
                println!("{}", format!("{} pending request(s)", requests.len()).cyan().bold());
                print_requests(&requests, now);
            }
        }

        Commands::Add {
            method,
            endpoint,
            data,
            config,
        } => {
            let method: HttpMethod = method.parse()?;
            let mut req = EnqueueRequest::new(method, endpoint);
            req.data = parse_json("data", data)?;
            req.config = parse_json("config", config)?;

            let id = queue.enqueue(req).await;

            println!("{}", "✓ Request queued".green().bold());
            println!("  {} {}", "ID:".bold(), id);
        }

        Commands::Remove { id } => {
            let known = queue.get_queue().await.iter().any(|req| req.id == id);
            queue.remove_from_queue(&id).await;

            if known {
                println!("{}", format!("✓ Request {} removed", id).green().bold());
            } else {
                println!("{}", format!("○ No pending request with ID {}", id).yellow());
            }
        }

        Commands::Clear => {
            let count = queue.len().await;
            queue.clear_queue().await;
            println!("{}", format!("✓ Cleared {} request(s)", count).green().bold());
        }

        Commands::Expired { max_age_hours } => {
            let expired = queue
                .get_expired_requests(max_age_hours.map(hours_to_ms))
                .await;
            if expired.is_empty() {
                println!("{}", "No expired requests".green());
            } else {
                println!("{}", format!("{} expired request(s)", expired.len()).yellow().bold());
                print_requests(&expired, now);
            }
        }

        Commands::Clean { max_age_hours } => {
            let removed = queue
                .clean_expired_requests(max_age_hours.map(hours_to_ms))
                .await;
            println!(
                "{}",
                format!("✓ Removed {} expired request(s)", removed).green().bold()
            );
        }

        Commands::Status => {
            let stats = queue.stats().await;
            let last_write = kv.updated_at(&storage_key).await?;

            println!("{}", "Queue Status".cyan().bold());
            println!();
            println!("  {} {}", "Store:".bold(), db_url);
            println!("  {} {}", "Key:".bold(), storage_key);
            println!("  {} {} / {}", "Pending:".bold(), stats.pending, stats.capacity);
            if let Some(oldest) = stats.oldest_timestamp {
                println!(
                    "  {} {} ({} old)",
                    "Oldest:".bold(),
                    format_timestamp(oldest),
                    format_age(now - oldest)
                );
            }
            if let Some(newest) = stats.newest_timestamp {
                println!("  {} {}", "Newest:".bold(), format_timestamp(newest));
            }
            match last_write {
                Some(ts) => println!("  {} {}", "Last write:".bold(), format_timestamp(ts)),
                None => println!("  {} never", "Last write:".bold()),
            }
        }

        Commands::Sweep {
            interval_secs,
            max_age_hours,
        } => {
            let interval = Duration::from_secs(interval_secs.unwrap_or(settings.sweep_interval_secs).max(1));
            let sweeper = ExpirySweeper::new(queue.clone(), interval, max_age_hours.map(hours_to_ms));

            let (shutdown_tx, shutdown_rx) = shutdown_channel();
            let handle = tokio::spawn(sweeper.run(shutdown_rx));

            println!(
                "{}",
                format!("Sweeping every {}s, press Ctrl+C to stop", interval.as_secs()).cyan()
            );
            tokio::signal::ctrl_c().await?;

            info!("Shutdown signal received");
            shutdown_tx.shutdown();
            let total = handle.await.context("Sweeper task failed")?;
            println!("{}", format!("✓ Removed {} expired request(s)", total).green().bold());
        }
    }

    Ok(())
}
