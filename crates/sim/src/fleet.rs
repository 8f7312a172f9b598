// Fleet simulation context. All mutable vehicle state lives here, owned by
// the run loop; nothing is process-global.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use fluxmos_core::{format_ts, ChargingStatus, TelemetryRecord, ENGINE_TAG};

// Fleet spawns scattered around a fixed home position.
const HOME_LAT: f64 = 37.773972;
const HOME_LON: f64 = -122.431297;

const SOC_DRAIN_PER_KMH: f64 = 0.0005;
const LOAD_DROP: f64 = 0.2;
const LOAD_DROP_CHANCE: f64 = 0.01;
const GPS_JITTER: f64 = 0.0001;

/// Mutable state for one simulated vehicle. `id` never changes after spawn.
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub speed: f64,
    pub soc: f64,
}

/// The simulated fleet plus its noise source.
///
/// A seed of 0 draws from entropy; any other seed makes the whole record
/// stream reproducible.
pub struct Fleet {
    vehicles: Vec<VehicleState>,
    rng: SmallRng,
    source_tag: String,
}

impl Fleet {
    pub fn spawn(size: usize, seed: u64, source_tag: &str) -> Self {
        let mut rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        let vehicles = (0..size)
            .map(|n| VehicleState {
                id: format!("V{}", n + 1),
                lat: HOME_LAT + rng.gen_range(-0.01..0.01),
                lon: HOME_LON + rng.gen_range(-0.01..0.01),
                speed: rng.gen_range(0.0..60.0),
                soc: rng.gen_range(30.0..100.0),
            })
            .collect();
        Self {
            vehicles,
            rng,
            source_tag: source_tag.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Advances one vehicle by one tick and builds its record.
    ///
    /// Update order matters: speed feeds the charge drain, charge feeds the
    /// voltage. Speed is clamped to >= 0 and charge to >= 0; the true
    /// position never moves, only the reported fix is jittered.
    pub fn advance(&mut self, idx: usize, now: DateTime<Utc>) -> TelemetryRecord {
        let v = &mut self.vehicles[idx];

        v.speed = (v.speed + self.rng.gen_range(-3.0..3.0)).max(0.0);
        let drop = if self.rng.gen_bool(LOAD_DROP_CHANCE) {
            LOAD_DROP
        } else {
            0.0
        };
        v.soc = (v.soc - v.speed * SOC_DRAIN_PER_KMH - drop).max(0.0);
        let battery_voltage = 300.0 + (v.soc / 100.0) * 120.0 + self.rng.gen_range(-2.0..2.0);
        let motor_rpm = (v.speed * self.rng.gen_range(20.0..40.0)) as i64;
        let gps = [
            v.lat + self.rng.gen_range(-GPS_JITTER..GPS_JITTER),
            v.lon + self.rng.gen_range(-GPS_JITTER..GPS_JITTER),
        ];

        TelemetryRecord {
            ts: format_ts(now),
            engine: ENGINE_TAG.to_string(),
            vehicle_id: v.id.clone(),
            speed: round2(v.speed),
            soc: round2(v.soc),
            battery_voltage: round2(battery_voltage),
            motor_rpm,
            gps,
            charging: ChargingStatus {
                plugged: false,
                kilowatts: 0.0,
            },
            extra: HashMap::from([("source".to_string(), json!(self.source_tag))]),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
