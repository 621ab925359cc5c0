//! ESP32 device DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::SensorDto;
use crate::domain::Esp32Device;
use crate::service::DeviceWithSensors;

/// Request body for registering or renaming a device.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeviceRequest {
    /// MAC-like identifier the board reports with.
    pub device_identifier: String,
}

/// A device as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceDto {
    /// Device identifier.
    pub id: i64,
    /// MAC-like identifier.
    pub device_identifier: String,
    /// Time of the last status report.
    pub last_communication: Option<DateTime<Utc>>,
}

impl From<Esp32Device> for DeviceDto {
    fn from(device: Esp32Device) -> Self {
        Self {
            id: device.id.get(),
            device_identifier: device.device_identifier,
            last_communication: device.last_communication,
        }
    }
}

/// A device together with its sensors.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceDetailDto {
    /// The device.
    #[serde(flatten)]
    pub device: DeviceDto,
    /// Sensors wired to the device.
    pub sensors: Vec<SensorDto>,
}

impl From<DeviceWithSensors> for DeviceDetailDto {
    fn from(detail: DeviceWithSensors) -> Self {
        Self {
            device: detail.device.into(),
            sensors: detail.sensors.into_iter().map(SensorDto::from).collect(),
        }
    }
}
