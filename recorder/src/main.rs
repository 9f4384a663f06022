//! Course Grabber Recorder - Main entry point.
//!
//! This binary starts the recorder with:
//! - Structured JSON logging
//! - A single engine task owning the session
//! - Graceful shutdown handling (SIGTERM/SIGINT)
//!
//! # Configuration
//!
//! See [`grabber_recorder::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! PORT=8787 GRABBER_DEFAULT_PROJECT_NAME="My Course" cargo run --bin grabber-recorder
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use grabber_recorder::config::Config;
use grabber_recorder::engine::Recorder;
use grabber_recorder::routes::{create_router, AppState};
use grabber_recorder::{RecorderError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => {
            info!("Recorder shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, startup = err.is_startup_error(), "Recorder failed");
            eprintln!("Error: {err}");
            if matches!(err, RecorderError::Config(_)) {
                print_env_help();
            }
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let recorder = Recorder::from_config(&config)?;

    info!(
        port = config.port,
        bind_addr = %config.bind_addr,
        manifest_name = %config.manifest_name,
        queue_capacity = config.queue_capacity,
        "Course Grabber recorder starting"
    );

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Recorder listening");

    let (handle, engine) = recorder.spawn(config.queue_capacity);
    let app = create_router(AppState::new(config, handle));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last handle; the engine drains its queue and exits.
    engine.await?;

    Ok(())
}

fn print_env_help() {
    eprintln!();
    eprintln!("Optional environment variables:");
    eprintln!("  PORT                          - HTTP server port (default: 8787)");
    eprintln!("  GRABBER_BIND_ADDR             - Bind address (default: 127.0.0.1)");
    eprintln!("  GRABBER_DEFAULT_PROJECT_NAME  - Name for unnamed sessions");
    eprintln!("  GRABBER_TITLE_SUFFIX_PATTERN  - Regex stripped from page titles");
    eprintln!("  GRABBER_MANIFEST_NAME         - Master manifest file name");
    eprintln!("  GRABBER_QUEUE_CAPACITY        - Engine queue depth (default: 1024)");
    eprintln!("  RUST_LOG                      - Log level filter (default: info)");
}

/// Initialize structured logging with tracing.
///
/// JSON output, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,axum::rejection=trace"));

    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .init();
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
