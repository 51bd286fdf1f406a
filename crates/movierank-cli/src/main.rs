//! MovieRank - a terminal front end for the MovieRank movie-rating service.
//!
//! Browse movies by genre, read and write star reviews, and keep a
//! watchlist. Run with a command for one-shot use, or without arguments for
//! an interactive shell.

mod app;
mod console;

use std::io;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use movierank_core::config::{Config, TokenBackend};

/// Keep the session in memory only
const EPHEMERAL_FLAG: &str = "--ephemeral";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes buffered log lines when dropped.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let ephemeral = args.iter().any(|a| a == EPHEMERAL_FLAG);
    args.retain(|a| a != EPHEMERAL_FLAG);

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if ephemeral {
        config.token_backend = TokenBackend::Memory;
    }

    let mut app = App::new(config)?;
    info!(api_url = %app.api_url(), "MovieRank starting");

    if args.is_empty() {
        app.run_shell().await?;
    } else {
        app.run_command(&args).await;
    }

    info!("MovieRank shutting down");
    Ok(())
}
