//! Sensor operations: admin management and device status reports.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Caller, ChangeEvent, NewSensor, ParkingLotId, Sensor, SensorId, SensorStatus,
};
use crate::error::ParkingError;
use crate::hub::BroadcastHub;
use crate::persistence::OccupancyStore;

use super::load_managed_lot;

/// Input for registering a sensor. The device is named by its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSensorRequest {
    /// Lot the sensor belongs to.
    pub parking_lot_id: ParkingLotId,
    /// Identifier of the device the sensor is wired to.
    pub device_identifier: String,
    /// Device-local index of the sensor.
    pub sensor_number: i32,
    /// Initial occupancy state.
    pub status: SensorStatus,
}

/// Coordinates sensor persistence and change events.
#[derive(Debug, Clone)]
pub struct SensorService {
    store: Arc<dyn OccupancyStore>,
    hub: BroadcastHub,
}

impl SensorService {
    /// Creates a new `SensorService`.
    #[must_use]
    pub fn new(store: Arc<dyn OccupancyStore>, hub: BroadcastHub) -> Self {
        Self { store, hub }
    }

    /// Registers a sensor in a lot the caller manages.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::ParkingLotNotFound`],
    /// [`ParkingError::Forbidden`], [`ParkingError::DeviceNotFound`] if no
    /// device reports under the identifier, or [`ParkingError::Conflict`]
    /// if the device already has a sensor with that number.
    pub async fn create(
        &self,
        caller: &Caller,
        request: NewSensorRequest,
    ) -> Result<Sensor, ParkingError> {
        load_managed_lot(self.store.as_ref(), caller, request.parking_lot_id).await?;
        let device = self
            .store
            .find_device_by_identifier(&request.device_identifier)
            .await?
            .ok_or_else(|| ParkingError::DeviceNotFound(request.device_identifier.clone()))?;

        let sensor = self
            .store
            .create_sensor(NewSensor {
                parking_lot_id: request.parking_lot_id,
                device_id: device.id,
                sensor_number: request.sensor_number,
                status: request.status,
            })
            .await?;
        tracing::info!(
            sensor_id = %sensor.id,
            lot_id = %sensor.parking_lot_id,
            device = %sensor.device_identifier,
            "sensor created"
        );

        self.hub.broadcast(ChangeEvent::sensor_created(&sensor));
        Ok(sensor)
    }

    /// Returns one sensor.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SensorNotFound`].
    pub async fn get(&self, id: SensorId) -> Result<Sensor, ParkingError> {
        self.store
            .get_sensor(id)
            .await?
            .ok_or_else(|| ParkingError::sensor_not_found(id))
    }

    /// Returns the sensors of a lot.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::ParkingLotNotFound`] if the lot does not
    /// exist.
    pub async fn list_by_lot(&self, lot_id: ParkingLotId) -> Result<Vec<Sensor>, ParkingError> {
        if self.store.get_parking_lot(lot_id).await?.is_none() {
            return Err(ParkingError::ParkingLotNotFound(lot_id));
        }
        self.store.list_sensors_by_lot(lot_id).await
    }

    /// Applies a status reported by a device.
    ///
    /// The sensor is located by the device's identifier and its local
    /// number. The device's last-communication time is refreshed on a best
    /// effort basis: failing to record it does not fail the report.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SensorNotFound`] if no live sensor matches.
    pub async fn report(
        &self,
        device_identifier: &str,
        sensor_number: i32,
        status: SensorStatus,
    ) -> Result<Sensor, ParkingError> {
        let sensor = self
            .store
            .find_sensor_by_device(device_identifier, sensor_number)
            .await?
            .ok_or_else(|| {
                ParkingError::SensorNotFound(format!("{device_identifier} #{sensor_number}"))
            })?;

        let updated = self.store.update_sensor_status(sensor.id, status).await?;
        tracing::debug!(
            sensor_id = %updated.id,
            device = %device_identifier,
            %status,
            "sensor report applied"
        );
        self.hub.broadcast(ChangeEvent::sensor_updated(&updated));

        // The status is already stored; a missed heartbeat only delays
        // `last_communication`.
        if let Err(e) = self.store.touch_device(updated.device_id, Utc::now()).await {
            tracing::warn!(
                device_id = %updated.device_id,
                error = %e,
                "failed to record device heartbeat"
            );
        }
        Ok(updated)
    }

    /// Sets a sensor's status on behalf of an admin who manages its lot.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SensorNotFound`],
    /// [`ParkingError::ParkingLotNotFound`] or [`ParkingError::Forbidden`].
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: SensorId,
        status: SensorStatus,
    ) -> Result<Sensor, ParkingError> {
        let sensor = self.get(id).await?;
        load_managed_lot(self.store.as_ref(), caller, sensor.parking_lot_id).await?;

        let updated = self.store.update_sensor_status(id, status).await?;
        tracing::info!(sensor_id = %id, %status, "sensor status updated");

        self.hub.broadcast(ChangeEvent::sensor_updated(&updated));
        Ok(updated)
    }

    /// Tombstones a sensor in a lot the caller manages.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SensorNotFound`],
    /// [`ParkingError::ParkingLotNotFound`] or [`ParkingError::Forbidden`].
    pub async fn delete(&self, caller: &Caller, id: SensorId) -> Result<(), ParkingError> {
        let sensor = self.get(id).await?;
        load_managed_lot(self.store.as_ref(), caller, sensor.parking_lot_id).await?;

        if !self.store.delete_sensor(id).await? {
            return Err(ParkingError::sensor_not_found(id));
        }
        tracing::info!(sensor_id = %id, "sensor deleted");

        self.hub.broadcast(ChangeEvent::sensor_deleted(id));
        Ok(())
    }
}
