mod config;

use std::net::SocketAddr;
use std::process;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wc_server::app_with_state;
use wc_server::state::AppState;

use crate::config::Cli;

pub const TRACING_TARGET_SERVER_STARTUP: &str = "wc_server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "wc_server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "wc_server::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    init_tracing();

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting console server"
    );

    let config = cli.console_config()?;
    let state = AppState::from_config(&config).context("failed to initialize the console")?;
    let router = app_with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!("invalid listen address {}:{}", config.server.host, config.server.port)
        })?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(target: TRACING_TARGET_SERVER_STARTUP, %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Initializes tracing with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %e,
            "failed to install Ctrl+C handler"
        );
        std::future::pending::<()>().await;
    }
    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        "received Ctrl+C, shutting down"
    );
}
