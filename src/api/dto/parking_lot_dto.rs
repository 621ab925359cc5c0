//! Parking lot DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{NewParkingLot, ParkingLotUpdate};
use crate::service::ParkingLotAvailability;

/// Request body for `POST /parking-lots` and `PUT /parking-lots/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParkingLotRequest {
    /// Display name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
}

impl ParkingLotRequest {
    /// Converts into creation input. The owner is filled in by the service.
    #[must_use]
    pub fn into_new(self) -> NewParkingLot {
        NewParkingLot {
            name: self.name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            owner: String::new(),
        }
    }

    /// Converts into replacement values for an existing lot.
    #[must_use]
    pub fn into_update(self) -> ParkingLotUpdate {
        ParkingLotUpdate {
            name: self.name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A lot with its current free-space count.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParkingLotDto {
    /// Lot identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Subject of the owning admin.
    pub owner: String,
    /// Number of free spaces.
    pub available_spaces: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<ParkingLotAvailability> for ParkingLotDto {
    fn from(entry: ParkingLotAvailability) -> Self {
        let lot = entry.lot;
        Self {
            id: lot.id.get(),
            name: lot.name,
            address: lot.address,
            latitude: lot.latitude,
            longitude: lot.longitude,
            owner: lot.owner,
            available_spaces: entry.available_spaces,
            created_at: lot.created_at,
            updated_at: lot.updated_at,
        }
    }
}
