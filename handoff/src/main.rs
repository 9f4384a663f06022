//! Course Grabber Handoff - pushes a recorded course to the desktop backend.
//!
//! # Commands
//!
//! - `grabber-handoff show`: Print the recorder's current export as JSON
//! - `grabber-handoff push`: Create the project, lessons and URLs in the backend
//!
//! # Environment Variables
//!
//! See the [`config`] module for available configuration options.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use grabber_handoff::config::Config;
use grabber_handoff::{fetch_export, read_export, BackendClient, ProjectExport, RetryPolicy};

/// Course Grabber Handoff.
///
/// Reads the lessons captured by the recorder and hands them to the
/// desktop backend for downloading.
#[derive(Parser, Debug)]
#[command(name = "grabber-handoff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    GRABBER_RECORDER_URL    Recorder URL (default: http://127.0.0.1:8787)
    GRABBER_BACKEND_URL     Backend API URL (default: http://localhost:8000/api)
    GRABBER_SAVE_LOCATION   Project save directory (default: ~/Course Grabber)
    GRABBER_MAX_RETRIES     Attempts per request, 1-10 (default: 5)

EXAMPLES:
    # Save the current recording
    grabber-handoff show > algebra.json

    # Push the live recording
    grabber-handoff push

    # Push a saved recording somewhere specific
    grabber-handoff push --file algebra.json --save-location ~/Videos/Algebra
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Print the recorder's current export as JSON.
    Show,

    /// Push an export to the backend.
    ///
    /// Fetches the export from the recorder unless --file is given.
    Push {
        /// Read the export from a JSON file instead of the recorder.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Override GRABBER_SAVE_LOCATION.
        #[arg(short, long)]
        save_location: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    match cli.command {
        Command::Show => runtime.block_on(run_show(&config)),
        Command::Push {
            file,
            save_location,
        } => runtime.block_on(run_push(&config, file, save_location)),
    }
}

async fn run_show(config: &Config) -> Result<()> {
    let export = fetch_export(&config.recorder_url)
        .await
        .with_context(|| format!("Failed to fetch export from {}", config.recorder_url))?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &export).context("Failed to write export")?;
    writeln!(stdout)?;
    Ok(())
}

async fn run_push(
    config: &Config,
    file: Option<PathBuf>,
    save_location: Option<PathBuf>,
) -> Result<()> {
    let export: ProjectExport = match file {
        Some(path) => read_export(&path)
            .with_context(|| format!("Failed to read export from {}", path.display()))?,
        None => fetch_export(&config.recorder_url)
            .await
            .with_context(|| format!("Failed to fetch export from {}", config.recorder_url))?,
    };

    let save_location = save_location.unwrap_or_else(|| config.save_location.clone());
    info!(
        project = %export.name,
        lessons = export.lessons.len(),
        urls = export.url_count(),
        save_location = %save_location.display(),
        backend = %config.backend_url,
        "Pushing export"
    );

    let retry = RetryPolicy::default().with_max_attempts(config.max_retries);
    let client = BackendClient::new(config.backend_url.clone(), retry)?;

    match client.push(&export, &save_location).await {
        Ok(summary) => {
            println!("{summary}");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "Push failed");
            if err.is_retryable() {
                eprintln!("The backend may be temporarily unavailable; try again later.");
            }
            Err(err.into())
        }
    }
}

/// Initializes the tracing subscriber with environment-based filtering.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}
