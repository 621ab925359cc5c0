//! ESP32 device registry operations.

use std::sync::Arc;

use crate::domain::device::normalize_identifier;
use crate::domain::{DeviceId, Esp32Device, Sensor};
use crate::error::ParkingError;
use crate::persistence::OccupancyStore;

/// A device and the sensors wired to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceWithSensors {
    /// The device.
    pub device: Esp32Device,
    /// Live sensors on the device.
    pub sensors: Vec<Sensor>,
}

/// Registers, renames and removes reporting devices. Emits no events.
#[derive(Debug, Clone)]
pub struct DeviceService {
    store: Arc<dyn OccupancyStore>,
}

impl DeviceService {
    /// Creates a new `DeviceService`.
    #[must_use]
    pub fn new(store: Arc<dyn OccupancyStore>) -> Self {
        Self { store }
    }

    /// Registers a device under `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidRequest`] for a blank identifier or
    /// [`ParkingError::Conflict`] if it is already registered.
    pub async fn register(&self, identifier: &str) -> Result<Esp32Device, ParkingError> {
        let identifier = normalize_identifier(identifier)?;
        let device = self.store.create_device(&identifier).await?;
        tracing::info!(device_id = %device.id, device = %device.device_identifier, "device registered");
        Ok(device)
    }

    /// Returns a device with its sensors.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DeviceNotFound`].
    pub async fn get(&self, id: DeviceId) -> Result<DeviceWithSensors, ParkingError> {
        let device = self.find(id).await?;
        let sensors = self.store.list_sensors_by_device(id).await?;
        Ok(DeviceWithSensors { device, sensors })
    }

    /// Returns every registered device.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::PersistenceError`] on storage failure.
    pub async fn list(&self) -> Result<Vec<Esp32Device>, ParkingError> {
        self.store.list_devices().await
    }

    /// Changes the identifier a device reports under.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DeviceNotFound`],
    /// [`ParkingError::InvalidRequest`] or [`ParkingError::Conflict`].
    pub async fn update(&self, id: DeviceId, identifier: &str) -> Result<Esp32Device, ParkingError> {
        let identifier = normalize_identifier(identifier)?;
        let mut device = self.find(id).await?;
        device.device_identifier = identifier;
        self.store.update_device(&device).await?;
        tracing::info!(device_id = %id, device = %device.device_identifier, "device renamed");
        Ok(device)
    }

    /// Deletes a device that has no live sensors.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DeviceNotFound`] or
    /// [`ParkingError::Conflict`] while sensors reference the device.
    pub async fn delete(&self, id: DeviceId) -> Result<(), ParkingError> {
        if !self.store.delete_device(id).await? {
            return Err(ParkingError::DeviceNotFound(format!("id {id}")));
        }
        tracing::info!(device_id = %id, "device deleted");
        Ok(())
    }

    async fn find(&self, id: DeviceId) -> Result<Esp32Device, ParkingError> {
        self.store
            .get_device(id)
            .await?
            .ok_or_else(|| ParkingError::DeviceNotFound(format!("id {id}")))
    }
}
