use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod recorder;
mod server;

use config::CollectorConfig;
use recorder::{Metrics, RecordLog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let cfg = CollectorConfig::from_env();

    // The header row must exist before the first session is accepted.
    let log = RecordLog::open(&cfg.log_path)
        .await
        .with_context(|| format!("failed to open record log {}", cfg.log_path.display()))?;
    let metrics = Metrics::new();
    let (records, queue) = mpsc::channel(256);
    tokio::spawn(recorder::writer_loop(log.clone(), queue, metrics.clone()));
    tokio::spawn(recorder::stats_loop(metrics.clone(), cfg.stats_interval_secs));

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    info!(addr = %cfg.bind_addr, log = %log.path().display(), "collector listening");

    tokio::select! {
        _ = server::serve(listener, records, metrics) => {}
        _ = shutdown_signal() => info!("shutdown signal received"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,tungstenite=warn,tokio_tungstenite=warn"))
        .unwrap();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install signal handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
