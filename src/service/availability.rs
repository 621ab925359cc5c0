//! Free-space aggregation over sensor states.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{ParkingLot, ParkingLotId, Sensor};
use crate::error::ParkingError;
use crate::persistence::OccupancyStore;

/// A lot together with its current number of free spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingLotAvailability {
    /// The lot.
    pub lot: ParkingLot,
    /// Number of sensors in the lot reporting free.
    pub available_spaces: u32,
}

/// Counts the sensors in `sensors` that report a free space.
#[must_use]
pub fn count_free(sensors: &[Sensor]) -> u32 {
    let free = sensors.iter().filter(|s| s.status.is_free()).count();
    u32::try_from(free).unwrap_or(u32::MAX)
}

/// Read-only view deriving availability from the store.
///
/// Never writes. Store failures are returned as-is; no call yields a
/// partial result.
#[derive(Debug, Clone)]
pub struct AvailabilityAggregator {
    store: Arc<dyn OccupancyStore>,
}

impl AvailabilityAggregator {
    /// Creates an aggregator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn OccupancyStore>) -> Self {
        Self { store }
    }

    /// Returns the number of free spaces in one lot. A lot without sensors
    /// has zero.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] if the sensors cannot be
    /// read.
    pub async fn available_spaces(&self, lot_id: ParkingLotId) -> Result<u32, ParkingError> {
        let sensors = self.store.list_sensors_by_lot(lot_id).await?;
        Ok(count_free(&sensors))
    }

    /// Returns the number of free spaces for every listed lot.
    ///
    /// Uses one grouped count instead of one query per lot. Lots that have
    /// no free sensor are present with zero.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] if either read fails.
    pub async fn available_spaces_for_all(
        &self,
    ) -> Result<HashMap<ParkingLotId, u32>, ParkingError> {
        let lots = self.store.list_parking_lots().await?;
        let counts = self.store.count_free_sensors_by_lot().await?;
        Ok(lots
            .iter()
            .map(|lot| (lot.id, counts.get(&lot.id).copied().unwrap_or(0)))
            .collect())
    }

    /// Returns every lot with its availability, ordered by lot id.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] if either read fails.
    pub async fn lots_with_availability(
        &self,
    ) -> Result<Vec<ParkingLotAvailability>, ParkingError> {
        let lots = self.store.list_parking_lots().await?;
        self.merge(lots).await
    }

    /// Returns the lots owned by `owner` with their availability.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] if either read fails.
    pub async fn lots_with_availability_for_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<ParkingLotAvailability>, ParkingError> {
        let lots = self.store.list_parking_lots_by_owner(owner).await?;
        self.merge(lots).await
    }

    /// Attaches the single-lot count to `lot`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] if the sensors cannot be
    /// read.
    pub async fn lot_with_availability(
        &self,
        lot: ParkingLot,
    ) -> Result<ParkingLotAvailability, ParkingError> {
        let available_spaces = self.available_spaces(lot.id).await?;
        Ok(ParkingLotAvailability {
            lot,
            available_spaces,
        })
    }

    async fn merge(
        &self,
        lots: Vec<ParkingLot>,
    ) -> Result<Vec<ParkingLotAvailability>, ParkingError> {
        let counts = self.store.count_free_sensors_by_lot().await?;
        Ok(lots
            .into_iter()
            .map(|lot| {
                let available_spaces = counts.get(&lot.id).copied().unwrap_or(0);
                ParkingLotAvailability {
                    lot,
                    available_spaces,
                }
            })
            .collect())
    }
}
