//! Occupancy sensors and their status vocabulary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceId, ParkingLotId, SensorId};
use crate::error::ParkingError;

/// Occupancy state of one parking space.
///
/// The vocabulary is closed: devices and admins must send exactly `"free"`
/// or `"occupied"`. Synonyms such as `"busy"` are rejected rather than
/// guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    /// The space is available.
    Free,
    /// The space is taken.
    Occupied,
}

impl SensorStatus {
    /// Canonical string marker for a free space.
    pub const FREE_MARKER: &'static str = "free";

    /// Canonical string marker for an occupied space.
    pub const OCCUPIED_MARKER: &'static str = "occupied";

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => Self::FREE_MARKER,
            Self::Occupied => Self::OCCUPIED_MARKER,
        }
    }

    /// Decodes a persisted status column.
    ///
    /// Only an exact `"free"` is free; every other stored value counts as
    /// occupied.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        if raw == Self::FREE_MARKER {
            Self::Free
        } else {
            Self::Occupied
        }
    }

    /// Returns `true` for [`SensorStatus::Free`].
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorStatus {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::FREE_MARKER => Ok(Self::Free),
            Self::OCCUPIED_MARKER => Ok(Self::Occupied),
            other => Err(ParkingError::InvalidSensorStatus(other.to_string())),
        }
    }
}

/// A sensor mounted on a parking space, wired to an ESP32 device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    /// Sensor identifier.
    pub id: SensorId,
    /// Lot the sensor belongs to.
    pub parking_lot_id: ParkingLotId,
    /// Device the sensor is wired to.
    pub device_id: DeviceId,
    /// Identifier string of the owning device.
    pub device_identifier: String,
    /// Device-local index of the sensor.
    pub sensor_number: i32,
    /// Current occupancy state.
    pub status: SensorStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Tombstone timestamp, set on soft delete.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields required to register a sensor. The device is already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSensor {
    /// Lot the sensor belongs to.
    pub parking_lot_id: ParkingLotId,
    /// Resolved owning device.
    pub device_id: DeviceId,
    /// Device-local index of the sensor.
    pub sensor_number: i32,
    /// Initial occupancy state.
    pub status: SensorStatus,
}
