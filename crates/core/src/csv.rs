// Record-log row layout. `gps`, `charging` and `extra` are stored as
// embedded serialized JSON text inside their row fields.

use crate::record::TelemetryRecord;

/// Header row written once when the record log is created.
pub const LOG_HEADER: &str = "ts,engine,vehicleId,speed,soc,batteryVoltage,motorRPM,gps,charging,extra";

/// Renders one log row for a record, without a trailing newline.
///
/// Fields containing commas, quotes or newlines are quoted with doubled
/// inner quotes, so a row always parses back into exactly 10 top-level
/// fields.
pub fn csv_row(record: &TelemetryRecord) -> Result<String, serde_json::Error> {
    let columns = [
        field(&record.ts),
        field(&record.engine),
        field(&record.vehicle_id),
        record.speed.to_string(),
        record.soc.to_string(),
        record.battery_voltage.to_string(),
        record.motor_rpm.to_string(),
        field(&serde_json::to_string(&record.gps)?),
        field(&serde_json::to_string(&record.charging)?),
        field(&serde_json::to_string(&record.extra)?),
    ];
    Ok(columns.join(","))
}

/// Splits a log row into its top-level fields, honoring quoting.
pub fn split_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = row.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' => quoted = true,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
