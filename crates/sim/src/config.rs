use std::env;
use std::time::Duration;

use hostname::get as get_hostname;

use fluxmos_core::DEFAULT_ENDPOINT;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub endpoint: String,
    pub fleet_size: usize,
    pub send_interval_ms: u64,
    /// RNG seed; 0 uses random entropy.
    pub seed: u64,
    /// Value of the `extra.source` field stamped on every frame.
    pub source_tag: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            fleet_size: 3,
            send_interval_ms: 250,
            seed: 0,
            source_tag: default_source_tag(),
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let mut cfg = SimConfig::default();

        if let Ok(v) = env::var("FLUXMOS_WS_URL") {
            if !v.is_empty() {
                cfg.endpoint = v;
            }
        }
        if let Ok(v) = env::var("FLUXMOS_FLEET_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.fleet_size = n;
            }
        }
        if let Ok(v) = env::var("FLUXMOS_SEND_INTERVAL_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.send_interval_ms = ms;
            }
        }
        if let Ok(v) = env::var("FLUXMOS_SIM_SEED") {
            if let Ok(seed) = v.parse::<u64>() {
                cfg.seed = seed;
            }
        }
        if let Ok(v) = env::var("FLUXMOS_SOURCE_TAG") {
            if !v.is_empty() {
                cfg.source_tag = v;
            }
        }

        cfg
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

fn default_source_tag() -> String {
    let host = get_hostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string());
    let pid = std::process::id();
    format!("fluxmos-sim-{}-{}", host, pid)
}
