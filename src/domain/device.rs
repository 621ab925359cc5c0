//! ESP32 reporting devices.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::DeviceId;
use crate::error::ParkingError;

/// A physical ESP32 board that reports the state of its sensors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Esp32Device {
    /// Device identifier.
    pub id: DeviceId,
    /// MAC-like identifier string the board reports with.
    pub device_identifier: String,
    /// Time of the last status report, if any.
    pub last_communication: Option<DateTime<Utc>>,
}

/// Normalizes and validates a device identifier.
///
/// Surrounding whitespace is trimmed; the identifier is otherwise kept as
/// sent so it matches what the board reports.
///
/// # Errors
///
/// Returns [`ParkingError::InvalidRequest`] if the identifier is empty.
pub fn normalize_identifier(raw: &str) -> Result<String, ParkingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParkingError::InvalidRequest(
            "device_identifier must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
