//! Parking lot operations. Every successful mutation is broadcast.

use std::sync::Arc;

use crate::domain::parking_lot::validate_lot_fields;
use crate::domain::{Caller, ChangeEvent, NewParkingLot, ParkingLot, ParkingLotId, ParkingLotUpdate};
use crate::error::ParkingError;
use crate::hub::BroadcastHub;
use crate::persistence::OccupancyStore;

use super::availability::{AvailabilityAggregator, ParkingLotAvailability};
use super::load_managed_lot;

/// Coordinates lot persistence, ownership checks and change events.
///
/// Existence and ownership are checked before any write. A rejected or
/// failed write broadcasts nothing; a successful one always broadcasts,
/// and the broadcast outcome never changes the returned result.
#[derive(Debug, Clone)]
pub struct ParkingLotService {
    store: Arc<dyn OccupancyStore>,
    availability: AvailabilityAggregator,
    hub: BroadcastHub,
}

impl ParkingLotService {
    /// Creates a new `ParkingLotService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn OccupancyStore>,
        availability: AvailabilityAggregator,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            store,
            availability,
            hub,
        }
    }

    /// Registers a lot owned by the caller.
    ///
    /// Any `owner` on `lot` is replaced by the caller's subject.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Unauthorized`] if the caller has no subject,
    /// [`ParkingError::InvalidRequest`] for a blank name or out-of-range
    /// coordinates, and [`ParkingError::Conflict`] if another lot sits at
    /// the same coordinates.
    pub async fn create(
        &self,
        caller: &Caller,
        mut lot: NewParkingLot,
    ) -> Result<ParkingLot, ParkingError> {
        lot.owner = caller.subject()?.to_string();
        validate_lot_fields(&lot.name, lot.latitude, lot.longitude)?;

        let created = self.store.create_parking_lot(lot).await?;
        tracing::info!(lot_id = %created.id, owner = %created.owner, "parking lot created");

        self.hub.broadcast(ChangeEvent::lot_created(&created));
        Ok(created)
    }

    /// Returns a lot the caller manages, with its availability.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::ParkingLotNotFound`] or
    /// [`ParkingError::Forbidden`].
    pub async fn get(
        &self,
        caller: &Caller,
        id: ParkingLotId,
    ) -> Result<ParkingLotAvailability, ParkingError> {
        let lot = self.managed_lot(caller, id).await?;
        self.availability.lot_with_availability(lot).await
    }

    /// Replaces a lot's name, address and coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::ParkingLotNotFound`],
    /// [`ParkingError::Forbidden`], [`ParkingError::InvalidRequest`] or
    /// [`ParkingError::Conflict`].
    pub async fn update(
        &self,
        caller: &Caller,
        id: ParkingLotId,
        update: ParkingLotUpdate,
    ) -> Result<ParkingLot, ParkingError> {
        let mut lot = self.managed_lot(caller, id).await?;
        validate_lot_fields(&update.name, update.latitude, update.longitude)?;

        lot.apply(&update);
        self.store.update_parking_lot(&lot).await?;
        tracing::info!(lot_id = %id, "parking lot updated");

        self.hub.broadcast(ChangeEvent::lot_updated(&lot));
        Ok(lot)
    }

    /// Tombstones a lot.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::ParkingLotNotFound`] or
    /// [`ParkingError::Forbidden`].
    pub async fn delete(&self, caller: &Caller, id: ParkingLotId) -> Result<(), ParkingError> {
        self.managed_lot(caller, id).await?;

        if !self.store.delete_parking_lot(id).await? {
            return Err(ParkingError::ParkingLotNotFound(id));
        }
        tracing::info!(lot_id = %id, "parking lot deleted");

        self.hub.broadcast(ChangeEvent::lot_deleted(id));
        Ok(())
    }

    /// Returns every lot with its availability. Public.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] on storage failure.
    pub async fn list(&self) -> Result<Vec<ParkingLotAvailability>, ParkingError> {
        self.availability.lots_with_availability().await
    }

    /// Returns the caller's own lots with their availability.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Unauthorized`] if the caller has no subject.
    pub async fn list_owned(
        &self,
        caller: &Caller,
    ) -> Result<Vec<ParkingLotAvailability>, ParkingError> {
        let subject = caller.subject()?;
        self.availability
            .lots_with_availability_for_owner(subject)
            .await
    }

    async fn managed_lot(
        &self,
        caller: &Caller,
        id: ParkingLotId,
    ) -> Result<ParkingLot, ParkingError> {
        load_managed_lot(self.store.as_ref(), caller, id).await
    }
}
