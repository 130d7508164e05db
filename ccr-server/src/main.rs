//! Carbon Credit Market Reporting Server
//!
//! Consumes business events from the upstream services, folds them into
//! the denormalized reporting store, and keeps the pre-aggregated views
//! and time partitions maintained.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use ccr_core::events::{EventBus, dead_letter_channel, delivery_channel, notification_channel};
use ccr_core::processors::{
    DeadLetterWriter, EventConsumer, NotificationWriter, Scheduler, SchedulerConfig,
};
use ccr_sdk::events::EventCategory;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Carbon credit market reporting service
#[derive(Parser, Debug)]
#[command(name = "ccr-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./ccr-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting ccr-server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load(&args.config, args.listen).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = config.server.listen;

    let database_url = config::database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Install the Prometheus recorder before anything records a metric.
    let metrics_handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        tracing::error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    // Shutdown fan-out for every background task.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Channel plumbing: one delivery queue per category, shared side-effect
    // channels for notifications and dead letters.
    let (user_tx, user_rx) = delivery_channel();
    let (trade_tx, trade_rx) = delivery_channel();
    let (payment_tx, payment_rx) = delivery_channel();
    let (issuance_tx, issuance_rx) = delivery_channel();
    let bus = EventBus::new(user_tx, trade_tx, payment_tx, issuance_tx);

    let (notification_tx, notification_rx) = notification_channel();
    let (dead_letter_tx, dead_letter_rx) = dead_letter_channel();

    let mut tasks = Vec::new();

    for (category, rx) in [
        (EventCategory::User, user_rx),
        (EventCategory::Trade, trade_rx),
        (EventCategory::Payment, payment_rx),
        (EventCategory::Issuance, issuance_rx),
    ] {
        let consumer = EventConsumer::new(
            category,
            db_pool.clone(),
            notification_tx.clone(),
            dead_letter_tx.clone(),
        );
        tasks.push(tokio::spawn(consumer.run(rx, shutdown_rx.clone())));
    }
    // Drop the wiring copies so the writer loops observe channel closure.
    drop(notification_tx);
    drop(dead_letter_tx);

    tasks.push(tokio::spawn(
        NotificationWriter::new(db_pool.clone()).run(notification_rx, shutdown_rx.clone()),
    ));
    tasks.push(tokio::spawn(
        DeadLetterWriter::new(db_pool.clone()).run(dead_letter_rx, shutdown_rx.clone()),
    ));

    let scheduler_config = SchedulerConfig {
        refresh_interval: Duration::from_secs(config.refresh.interval_secs),
        nightly_refresh_interval: Duration::from_secs(config.refresh.nightly_interval_secs),
        log_cleanup_interval: Duration::from_secs(config.refresh.log_cleanup_interval_secs),
        partition_interval: Duration::from_secs(config.partitions.interval_secs),
        gauge_interval: Duration::from_secs(30),
        create_ahead_months: config.partitions.create_ahead_months,
    };
    let scheduler = Scheduler::with_default_jobs(db_pool.clone(), scheduler_config);
    tasks.extend(scheduler.spawn(shutdown_rx.clone()));

    let app_state = AppState::new(db_pool.clone(), bus, metrics_handle);
    let router = build_router(app_state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // The HTTP server returned (shutdown signal); stop the pipeline.
    tracing::info!("Stopping background tasks...");
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
