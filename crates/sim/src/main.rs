use anyhow::{bail, Context};
use chrono::Utc;
use dotenvy::dotenv;
use futures_util::{SinkExt, StreamExt};
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;
mod fleet;

use config::SimConfig;
use fleet::Fleet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let cfg = SimConfig::from_env();
    Url::parse(&cfg.endpoint)
        .with_context(|| format!("invalid telemetry endpoint {}", cfg.endpoint))?;

    let mut fleet = Fleet::spawn(cfg.fleet_size, cfg.seed, &cfg.source_tag);
    if fleet.is_empty() {
        bail!("FLUXMOS_FLEET_SIZE must be at least 1");
    }

    // No reconnect: a failed connect or a mid-stream send error ends the process.
    let (ws, _) = connect_async(cfg.endpoint.as_str())
        .await
        .with_context(|| format!("telemetry endpoint {} unreachable", cfg.endpoint))?;
    info!(endpoint = %cfg.endpoint, fleet = cfg.fleet_size, "connected");
    let (mut write, _read) = ws.split();

    loop {
        for idx in 0..fleet.len() {
            let record = fleet.advance(idx, Utc::now());
            let frame = record.encode().context("failed to encode frame")?;
            write
                .send(Message::Text(frame))
                .await
                .context("mid-stream send failed")?;
            info!(vehicle = %record.vehicle_id, soc = record.soc, "frame sent");
            sleep(cfg.send_interval()).await;
        }
    }
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
