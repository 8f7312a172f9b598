use std::env;
use std::path::PathBuf;

use fluxmos_core::DEFAULT_BIND_ADDR;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub bind_addr: String,
    pub log_path: PathBuf,
    pub stats_interval_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_path: PathBuf::from("./data/fluxmos_evs.csv"),
            stats_interval_secs: 60,
        }
    }
}

impl CollectorConfig {
    pub fn from_env() -> Self {
        let mut cfg = CollectorConfig::default();

        if let Ok(v) = env::var("FLUXMOS_BIND_ADDR") {
            if !v.is_empty() {
                cfg.bind_addr = v;
            }
        }
        if let Ok(v) = env::var("FLUXMOS_LOG_PATH") {
            if !v.is_empty() {
                cfg.log_path = PathBuf::from(v);
            }
        }
        if let Ok(v) = env::var("FLUXMOS_STATS_INTERVAL_SECS") {
            if let Ok(secs) = v.parse::<u64>() {
                cfg.stats_interval_secs = secs;
            }
        }

        cfg
    }
}
