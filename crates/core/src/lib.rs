pub mod csv;
pub mod record;

pub use csv::{csv_row, split_row, LOG_HEADER};
pub use record::{format_ts, ChargingStatus, DecodeError, TelemetryRecord, ENGINE_TAG};

/// Default WebSocket endpoint the simulator connects to.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Default address the collector listens on.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8765";
