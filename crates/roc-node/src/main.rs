//! # ROC Node - vessel handover coordinator
//!
//! Runs one handover session for a vessel crossing a safety gate between
//! two Remote Operations Centers, and exposes it over HTTP.
//!
//! ## Architecture
//! ```text
//! Redis pub/sub ──subscriber──┐
//! TokioTimers ────ticks───────┼──▶ SessionActor ──▶ RedisTransport ──publisher──▶ Redis
//! HTTP operator ──commands────┘         │
//!                                       └──watch──▶ GET /handover
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use handover_core::HandoverSession;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod actor;
mod config;
mod routes;
mod state;
mod timers;
mod transport;

#[cfg(test)]
mod testing;

use actor::SessionActor;
use config::AppConfig;
use state::AppState;
use timers::TokioTimers;
use transport::{ChannelLayout, RedisTransport, run_publisher, run_subscriber};

/// ROC Node - safety gate handover coordinator
#[derive(Parser, Debug)]
#[command(name = "roc-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/roc-node.toml")]
    config: String,

    /// Identity of this ROC (overrides config)
    #[arg(long, env = "ROC_ID")]
    roc: Option<String>,

    /// Redis URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("⚓ Starting ROC node v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    let session_config = config.session_config()?;
    info!("📋 Configuration loaded from {}", args.config);

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let publisher_shutdown = shutdown_tx.subscribe();
    let subscriber_shutdown = shutdown_tx.subscribe();
    let actor_shutdown = shutdown_tx.subscribe();

    // Session mailbox shared by subscriber, timers and HTTP handlers
    let (inbox_tx, inbox_rx) = tokio::sync::mpsc::channel(config.mailbox_capacity);

    let client = redis::Client::open(config.redis_url.as_str())
        .context("Failed to create Redis client")?;
    let layout = ChannelLayout::new(&session_config.vessel_id, &session_config.gate_id);
    let (transport, outbox) = RedisTransport::new(layout.clone());
    let publisher_connected = transport.connected();
    let subscriber_connected = Arc::new(AtomicBool::new(false));

    // Spawn Redis publisher
    let publisher_client = client.clone();
    let publisher_flag = publisher_connected.clone();
    tokio::spawn(async move {
        if let Err(e) =
            run_publisher(publisher_client, outbox, publisher_flag, publisher_shutdown).await
        {
            error!("Redis publisher failed: {:#}", e);
        }
    });

    // Spawn Redis subscriber
    let subscriber_inbox = inbox_tx.clone();
    let subscriber_flag = subscriber_connected.clone();
    tokio::spawn(async move {
        if let Err(e) = run_subscriber(
            client,
            layout,
            subscriber_inbox,
            subscriber_flag,
            subscriber_shutdown,
        )
        .await
        {
            error!("Redis subscriber failed: {:#}", e);
        }
    });

    // Build the session and its actor
    let timers = TokioTimers::new(inbox_tx.clone());
    let session = HandoverSession::new(session_config, transport, timers)
        .context("Failed to create handover session")?;
    let (actor, snapshots) = SessionActor::new(session, inbox_rx);

    let actor_stopped = shutdown_tx.clone();
    let actor_task = tokio::spawn(async move {
        let result = actor.run(actor_shutdown).await;
        // Take the rest of the node down with the session
        let _ = actor_stopped.send(());
        result
    });

    // Initialize application state
    let state = AppState::new(
        config.clone(),
        inbox_tx,
        snapshots,
        publisher_connected,
        subscriber_connected,
    );

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 ROC node listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let mut server_shutdown = shutdown_tx.subscribe();
    let shutdown_signal = async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("🛑 Shutdown signal received");
                let _ = shutdown_tx.send(());
            }
            _ = server_shutdown.recv() => {
                info!("🛑 Handover session stopped");
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    actor_task
        .await
        .context("Handover session task panicked")?
        .context("Handover session failed")?;

    info!("👋 ROC node shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
