//! Parking lot aggregate and its create/update inputs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ParkingLotId;
use crate::error::ParkingError;

/// A registered parking lot.
///
/// Owned by the admin whose identity-provider subject is stored in
/// [`ParkingLot::owner`]. Deleting a lot only sets `deleted_at`; tombstoned
/// lots are never returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingLot {
    /// Lot identifier.
    pub id: ParkingLotId,
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
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Tombstone timestamp, set on soft delete.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ParkingLot {
    /// Returns `true` if the lot is owned by `subject`.
    #[must_use]
    pub fn is_owned_by(&self, subject: &str) -> bool {
        !subject.is_empty() && self.owner == subject
    }

    /// Overwrites the mutable fields with `update`.
    pub fn apply(&mut self, update: &ParkingLotUpdate) {
        self.name.clone_from(&update.name);
        self.address.clone_from(&update.address);
        self.latitude = update.latitude;
        self.longitude = update.longitude;
        self.updated_at = Utc::now();
    }
}

/// Fields required to register a new lot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParkingLot {
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
}

/// Replacement values for an existing lot.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingLotUpdate {
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
}

/// Validates a lot's name and coordinates.
///
/// # Errors
///
/// Returns [`ParkingError::InvalidRequest`] if the name is blank or the
/// coordinates fall outside the WGS84 range.
pub fn validate_lot_fields(name: &str, latitude: f64, longitude: f64) -> Result<(), ParkingError> {
    if name.trim().is_empty() {
        return Err(ParkingError::InvalidRequest(
            "parking lot name must not be empty".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ParkingError::InvalidRequest(format!(
            "latitude {latitude} out of range"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ParkingError::InvalidRequest(format!(
            "longitude {longitude} out of range"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_lot(owner: &str) -> ParkingLot {
        let now = Utc::now();
        ParkingLot {
            id: ParkingLotId::new(1),
            name: "Centro".to_string(),
            address: "Calle 1 # 2-3".to_string(),
            latitude: 4.6,
            longitude: -74.08,
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn ownership_matches_subject() {
        let lot = make_lot("auth0|abc");
        assert!(lot.is_owned_by("auth0|abc"));
        assert!(!lot.is_owned_by("auth0|other"));
    }

    #[test]
    fn empty_subject_never_owns() {
        let lot = make_lot("");
        assert!(!lot.is_owned_by(""));
    }

    #[test]
    fn apply_overwrites_fields() {
        let mut lot = make_lot("auth0|abc");
        lot.apply(&ParkingLotUpdate {
            name: "Norte".to_string(),
            address: "Av 7".to_string(),
            latitude: 4.7,
            longitude: -74.05,
        });
        assert_eq!(lot.name, "Norte");
        assert_eq!(lot.address, "Av 7");
        assert!((lot.latitude - 4.7).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_lot_fields("A", 91.0, 0.0).is_err());
        assert!(validate_lot_fields("A", 0.0, -181.0).is_err());
        assert!(validate_lot_fields(" ", 0.0, 0.0).is_err());
        assert!(validate_lot_fields("A", 4.6, -74.0).is_ok());
    }
}
