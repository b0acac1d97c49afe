//! docanalysis - document analysis API server.
//!
//! Authenticates users, validates uploaded CSV files, analyzes documents
//! with a cloud cognitive service and keeps an exportable audit trail.

use docanalysis::{cli, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if config::debug_from_env() {
        "docanalysis=debug,tower_http=debug"
    } else if cli::is_verbose() {
        "docanalysis=info"
    } else {
        "docanalysis=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
