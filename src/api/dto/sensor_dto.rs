//! Sensor DTOs for admin management and device reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ParkingLotId, Sensor, SensorStatus};
use crate::error::ParkingError;
use crate::service::NewSensorRequest;

/// Request body for `POST /sensors`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSensorRequest {
    /// Lot the sensor belongs to.
    pub parking_lot_id: i64,
    /// Identifier of the owning device.
    pub device_identifier: String,
    /// Device-local index.
    pub sensor_number: i32,
    /// Initial status, `"free"` or `"occupied"`.
    pub status: String,
}

impl CreateSensorRequest {
    /// Validates the status and converts into service input.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidSensorStatus`] for an unknown status.
    pub fn into_request(self) -> Result<NewSensorRequest, ParkingError> {
        Ok(NewSensorRequest {
            parking_lot_id: ParkingLotId::new(self.parking_lot_id),
            device_identifier: self.device_identifier.trim().to_string(),
            sensor_number: self.sensor_number,
            status: self.status.parse()?,
        })
    }
}

/// Request body for `PUT /sensors/report`, sent by devices.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SensorReportRequest {
    /// Identifier the device reports under.
    pub device_identifier: String,
    /// Device-local index.
    pub sensor_number: i32,
    /// New status, `"free"` or `"occupied"`.
    pub status: String,
}

/// Request body for `PUT /sensors/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SensorStatusRequest {
    /// New status, `"free"` or `"occupied"`.
    pub status: String,
}

/// Query parameters for `GET /sensors`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct SensorListParams {
    /// Lot whose sensors to list.
    pub parking_lot_id: i64,
}

/// A sensor as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorDto {
    /// Sensor identifier.
    pub id: i64,
    /// Owning lot.
    pub parking_lot_id: i64,
    /// Owning device.
    pub device_id: i64,
    /// Identifier of the owning device.
    pub device_identifier: String,
    /// Device-local index.
    pub sensor_number: i32,
    /// Current status.
    #[schema(value_type = String, example = "free")]
    pub status: SensorStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Sensor> for SensorDto {
    fn from(sensor: Sensor) -> Self {
        Self {
            id: sensor.id.get(),
            parking_lot_id: sensor.parking_lot_id.get(),
            device_id: sensor.device_id.get(),
            device_identifier: sensor.device_identifier,
            sensor_number: sensor.sensor_number,
            status: sensor.status,
            created_at: sensor.created_at,
            updated_at: sensor.updated_at,
        }
    }
}
