// Record log persistence. Sessions forward decoded records over a channel
// to a single writer task, so appends interleave at row granularity.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{error, info};

use fluxmos_core::{csv_row, TelemetryRecord, LOG_HEADER};

/// The durable append-only row store of received telemetry.
///
/// The file handle is acquired per append and released after the flush;
/// no handle is held across writes.
#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    /// Opens the log, creating it with the fixed header row if it does not
    /// exist yet. Runs before any session is accepted.
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, format!("{}\n", LOG_HEADER)).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes before returning. Each append is a
    /// single write, so concurrent appends never corrupt a row.
    pub async fn append(&self, record: &TelemetryRecord) -> io::Result<()> {
        let mut row = csv_row(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        row.push('\n');
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(row.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Process-local counters, logged periodically by the stats task.
#[derive(Debug, Default)]
pub struct Metrics {
    pub sessions: AtomicI64,
    pub frames_received: AtomicU64,
    pub frames_discarded: AtomicU64,
    pub rows_written: AtomicU64,
    pub write_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Drains the record queue and appends each record to the log.
///
/// A failed append is logged and the record dropped; the loop continues and
/// the owning session is unaffected.
pub async fn writer_loop(
    log: RecordLog,
    mut records: mpsc::Receiver<TelemetryRecord>,
    metrics: Arc<Metrics>,
) {
    while let Some(record) = records.recv().await {
        match log.append(&record).await {
            Ok(()) => {
                metrics.rows_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, vehicle = %record.vehicle_id, "append failed; record dropped");
            }
        }
    }
}

pub async fn stats_loop(metrics: Arc<Metrics>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.tick().await;
    loop {
        ticker.tick().await;
        info!(
            sessions = metrics.sessions.load(Ordering::Relaxed),
            received = metrics.frames_received.load(Ordering::Relaxed),
            discarded = metrics.frames_discarded.load(Ordering::Relaxed),
            rows = metrics.rows_written.load(Ordering::Relaxed),
            write_errors = metrics.write_errors.load(Ordering::Relaxed),
            "collector stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxmos_core::{split_row, ChargingStatus, ENGINE_TAG};
    use serde_json::json;
    use std::collections::HashMap;

    fn sample(vehicle: &str) -> TelemetryRecord {
        TelemetryRecord {
            ts: "2026-08-07T12:00:00Z".to_string(),
            engine: ENGINE_TAG.to_string(),
            vehicle_id: vehicle.to_string(),
            speed: 12.3,
            soc: 88.0,
            battery_voltage: 405.6,
            motor_rpm: 321,
            gps: [37.7741, -122.4309],
            charging: ChargingStatus { plugged: false, kilowatts: 0.0 },
            extra: HashMap::from([("source".to_string(), json!("test"))]),
        }
    }

    #[tokio::test]
    async fn open_writes_header_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evs.csv");

        RecordLog::open(&path).await.unwrap();
        RecordLog::open(&path).await.unwrap();

        let text = fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, format!("{}\n", LOG_HEADER));
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/evs.csv");
        RecordLog::open(&path).await.unwrap();
        assert!(fs::metadata(&path).await.is_ok());
    }

    #[tokio::test]
    async fn n_appends_yield_n_plus_header_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::open(dir.path().join("evs.csv")).await.unwrap();

        for _ in 0..5 {
            log.append(&sample("V1")).await.unwrap();
        }

        let text = fs::read_to_string(log.path()).await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], LOG_HEADER);
        assert!(lines[1..].iter().all(|l| l.contains("V1")));
    }

    #[tokio::test]
    async fn concurrent_appends_never_tear_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::open(dir.path().join("evs.csv")).await.unwrap();

        let mut tasks = Vec::new();
        for n in 0..4 {
            let log = log.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..10 {
                    log.append(&sample(&format!("V{}", n + 1))).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let text = fs::read_to_string(log.path()).await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 41);
        for line in &lines {
            assert_eq!(split_row(line).len(), 10);
        }
    }

    #[tokio::test]
    async fn writer_loop_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::open(dir.path().join("evs.csv")).await.unwrap();
        let metrics = Metrics::new();
        let (tx, rx) = mpsc::channel(8);

        let writer = tokio::spawn(writer_loop(log.clone(), rx, metrics.clone()));
        for _ in 0..3 {
            tx.send(sample("V1")).await.unwrap();
        }
        drop(tx);
        writer.await.unwrap();

        assert_eq!(metrics.rows_written.load(Ordering::Relaxed), 3);
        let text = fs::read_to_string(log.path()).await.unwrap();
        assert_eq!(text.lines().count(), 4);
    }
}
