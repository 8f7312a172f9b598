// Wire-level telemetry record shared by the simulator and the collector.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed tag identifying the producing subsystem on every frame.
pub const ENGINE_TAG: &str = "EVS";

/// Charging state reported with each record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargingStatus {
    pub plugged: bool,
    #[serde(rename = "kW")]
    pub kilowatts: f64,
}

/// One telemetry frame for one vehicle at one tick.
///
/// Serializes to a single JSON object with the exact field set
/// `ts, engine, vehicleId, speed, soc, batteryVoltage, motorRPM, gps,
/// charging, extra`. Records are immutable once built and self-contained;
/// per vehicle, `ts` never decreases across frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub ts: String,
    pub engine: String,
    #[serde(rename = "vehicleId")]
    pub vehicle_id: String,
    pub speed: f64,
    pub soc: f64,
    #[serde(rename = "batteryVoltage")]
    pub battery_voltage: f64,
    #[serde(rename = "motorRPM")]
    pub motor_rpm: i64,
    pub gps: [f64; 2],
    pub charging: ChargingStatus,
    /// Open mapping for forward-compatible metadata.
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
#[error("malformed telemetry frame: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

impl TelemetryRecord {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Formats a timestamp the way the wire expects it: UTC, second precision,
/// `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_ts(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample(vehicle: &str) -> TelemetryRecord {
        TelemetryRecord {
            ts: "2026-08-07T12:00:00Z".to_string(),
            engine: ENGINE_TAG.to_string(),
            vehicle_id: vehicle.to_string(),
            speed: 42.17,
            soc: 87.5,
            battery_voltage: 404.99,
            motor_rpm: 1234,
            gps: [37.773972, -122.431297],
            charging: ChargingStatus { plugged: false, kilowatts: 0.0 },
            extra: HashMap::from([("source".to_string(), json!("test"))]),
        }
    }

    #[test]
    fn encode_decode_round_trips() {
        let record = sample("V1");
        let frame = record.encode().unwrap();
        let back = TelemetryRecord::decode(&frame).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn wire_field_set_is_exact() {
        let frame = sample("V1").encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "batteryVoltage",
                "charging",
                "engine",
                "extra",
                "gps",
                "motorRPM",
                "speed",
                "soc",
                "ts",
                "vehicleId",
            ]
        );
        let charging = obj["charging"].as_object().unwrap();
        assert!(charging.contains_key("plugged"));
        assert!(charging.contains_key("kW"));
        assert_eq!(obj["gps"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let frame = r#"{"ts":"2026-08-07T12:00:00Z","engine":"EVS","speed":1.0}"#;
        assert!(TelemetryRecord::decode(frame).is_err());
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(TelemetryRecord::decode("not a frame").is_err());
    }

    #[test]
    fn timestamp_format_is_fixed() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 9, 5, 3).unwrap();
        assert_eq!(format_ts(at), "2026-08-07T09:05:03Z");
    }
}
