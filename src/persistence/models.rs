//! Database row models and their conversion into domain types.

use chrono::{DateTime, Utc};

use crate::domain::{Admin, Esp32Device, ParkingLot, Sensor, SensorStatus};

/// A row from the `parking_lots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParkingLotRow {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Subject of the owning admin.
    pub owner: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Tombstone timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ParkingLotRow> for ParkingLot {
    fn from(row: ParkingLotRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            owner: row.owner,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// A `sensors` row joined with its device's identifier.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SensorRow {
    /// Primary key.
    pub id: i64,
    /// Owning lot.
    pub parking_lot_id: i64,
    /// Owning device.
    pub device_id: i64,
    /// Identifier string of the owning device.
    pub device_identifier: String,
    /// Device-local index.
    pub sensor_number: i32,
    /// Raw status column.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Tombstone timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<SensorRow> for Sensor {
    fn from(row: SensorRow) -> Self {
        Self {
            id: row.id.into(),
            parking_lot_id: row.parking_lot_id.into(),
            device_id: row.device_id.into(),
            device_identifier: row.device_identifier,
            sensor_number: row.sensor_number,
            status: SensorStatus::from_stored(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// A row from the `esp32_devices` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeviceRow {
    /// Primary key.
    pub id: i64,
    /// MAC-like identifier.
    pub device_identifier: String,
    /// Last report timestamp.
    pub last_communication: Option<DateTime<Utc>>,
}

impl From<DeviceRow> for Esp32Device {
    fn from(row: DeviceRow) -> Self {
        Self {
            id: row.id.into(),
            device_identifier: row.device_identifier,
            last_communication: row.last_communication,
        }
    }
}

/// A row from the `admins` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRow {
    /// Primary key.
    pub id: i64,
    /// Identity-provider subject.
    pub subject: String,
    /// Tax identification number.
    pub nit: String,
    /// Profile photo URL.
    pub photo_url: String,
    /// Contact phone number.
    pub contact_phone: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id.into(),
            subject: row.subject,
            nit: row.nit,
            photo_url: row.photo_url,
            contact_phone: row.contact_phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
