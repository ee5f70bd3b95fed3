use std::path::PathBuf;

use clap::Parser;
use sensorlink_ingest::{
    ByteSource, Config, MemoryStorage, MockSource, SensorStorage, SerialSource, SourceConfig,
    SqliteStorage, StorageConfig, TcpSource, api, run_collector,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sensorlink-ingest")]
#[command(about = "Sensor telemetry link ingest service")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sensorlink.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,sensorlink_ingest=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    match config.storage {
        StorageConfig::Memory => {
            info!("Using in-memory storage");
            run_ingest(config, MemoryStorage::default()).await?;
        }
        StorageConfig::Sqlite { ref path } => {
            info!(path = ?path, "Using SQLite storage");
            let storage = SqliteStorage::new(path).await?;
            run_ingest(config, storage).await?;
        }
    }

    Ok(())
}

async fn run_ingest<S>(config: Config, storage: S) -> color_eyre::Result<()>
where
    S: SensorStorage + Clone,
{
    let cancel = CancellationToken::new();

    match &config.source {
        SourceConfig::Mock {
            frame_interval_ms,
            device_count,
            corrupt_percent,
            noise_percent,
        } => {
            info!(
                frame_interval_ms,
                device_count, corrupt_percent, noise_percent, "Using mock byte source"
            );
            let source = MockSource::new(
                *frame_interval_ms,
                *device_count,
                *corrupt_percent,
                *noise_percent,
            );
            run_source(source, cancel, storage, &config).await?;
        }
        SourceConfig::Tcp { addr } => {
            info!(?addr, "Using TCP byte source");
            run_source(TcpSource::new(*addr), cancel, storage, &config).await?;
        }
        SourceConfig::Serial { path, baud_rate } => {
            info!(path = %path, baud_rate, "Using serial byte source");
            let source = SerialSource::new(path.clone(), *baud_rate);
            run_source(source, cancel, storage, &config).await?;
        }
    };

    Ok(())
}

async fn run_source<B: ByteSource, S>(
    source: B,
    cancel: CancellationToken,
    storage: S,
    config: &Config,
) -> color_eyre::Result<()>
where
    S: SensorStorage + Clone,
{
    let link_rx = source.start(cancel.clone()).await?;

    let storage_for_collector = storage.clone();
    let cancel_for_collector = cancel.clone();
    let collector_handle = tokio::spawn(async move {
        run_collector(link_rx, storage_for_collector, cancel_for_collector).await;
    });

    let http_addr = config.server.http_addr;
    let axum_app = api::router(storage);
    let axum_listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    let cancel_for_http = cancel.clone();

    tokio::select! {
        result = axum::serve(axum_listener, axum_app).with_graceful_shutdown(async move {
            cancel_for_http.cancelled().await;
        }) => {
            if let Err(e) = result {
                error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
            cancel.cancel();
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    let _ = collector_handle.await;

    info!("sensorlink-ingest shut down complete");
    Ok(())
}
