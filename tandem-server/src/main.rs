//! tandem-server - Two-participant preference matching service
//!
//! Hosts the room engine behind a WebSocket endpoint, with health, room
//! statistics, and an SSE lifecycle stream for monitoring.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tandem_common::config::{load_config, ConfigOverrides};
use tandem_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tandem-server
#[derive(Parser, Debug)]
#[command(name = "tandem-server")]
#[command(about = "Two-participant preference matching server")]
#[command(version)]
struct Args {
    /// Path to config.toml (overrides TANDEM_CONFIG and default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "TANDEM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TANDEM_PORT")]
    port: Option<u16>,

    /// Seconds before an unanswered card is rated neutral (0 disables)
    #[arg(long, env = "TANDEM_CHOICE_TIMEOUT")]
    choice_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tandem_server=info,tandem_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Tandem server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let overrides = ConfigOverrides {
        host: args.host,
        port: args.port,
        choice_timeout_secs: args.choice_timeout,
    };
    let config = load_config(args.config.as_deref(), overrides).context("Failed to load configuration")?;

    if config.choice_timeout_secs > 0 {
        info!("Auto-neutral after {}s per card", config.choice_timeout_secs);
    }
    let bind_addr = config.bind_addr();

    let state = AppState::new(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("tandem-server listening on http://{}", bind_addr);
    info!("WebSocket endpoint: ws://{}/ws", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
