//! Chronicle Query Server
//!
//! Run with: cargo run --bin chronicle-query -- --config config.toml
//!
//! Startup order: load config, seed the bucket store from `storage.data_dir`,
//! open the query gate, then serve. Environment variables are listed in
//! [`chronicle_query::config::generate_default_config`].

use chronicle_query::api::{serve, AppState};
use chronicle_query::config::{Config, LoggingConfig};
use chronicle_query::pipeline::AggregateRegistry;
use chronicle_query::service::{DataService, ReadyState};
use chronicle_query::storage::{load_dir, MemoryStore};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chronicle-query")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Time-series query server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging)?;
    tracing::info!("Starting Chronicle Query server v{}", env!("CARGO_PKG_VERSION"));

    let timezone = config.timezone()?;
    let store = Arc::new(MemoryStore::new(config.timeframe_table()?));
    let service = DataService::new(
        store.clone(),
        store.clone(),
        Arc::new(AggregateRegistry::with_builtins()),
    )
    .with_timezone(timezone);

    tracing::info!("Data directory: {:?}", config.storage.data_dir);
    let report = load_dir(&store, Path::new(&config.storage.data_dir))?;
    tracing::info!(
        buckets = report.buckets_loaded,
        rows = report.rows_loaded,
        failed_files = report.files_failed,
        failed_dirs = report.dirs_failed,
        "Storage seeded"
    );
    for error in &report.errors {
        tracing::warn!("{}", error);
    }

    service.readiness().set(ReadyState::Ready);

    let state = AppState::new(service, config.api.clone());
    serve(state, &config.api).await?;

    tracing::info!("Chronicle Query server stopped");
    Ok(())
}

/// Install the global subscriber: `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("chronicle_query={},tower_http=info", logging.level).into()
    });

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
    Ok(())
}
