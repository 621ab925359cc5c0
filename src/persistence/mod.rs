//! Persistence layer: the occupancy store.
//!
//! [`OccupancyStore`] is the only data-access surface the services use.
//! [`postgres::PostgresStore`] backs it with `sqlx::PgPool`;
//! [`memory::MemoryStore`] keeps everything in process for tests and
//! database-less runs.

pub mod memory;
pub mod models;
pub mod postgres;

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Admin, DeviceId, Esp32Device, NewParkingLot, NewSensor, ParkingLot, ParkingLotId, Sensor,
    SensorId, SensorStatus,
};
use crate::error::ParkingError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Point, scoped and grouped access to lots, sensors, devices and admins.
///
/// Tombstoned lots and sensors are invisible to every method.
#[async_trait]
pub trait OccupancyStore: Send + Sync + Debug {
    // ── Parking lots ────────────────────────────────────────────────────

    /// Persists a new lot.
    ///
    /// # Errors
    ///
    /// [`ParkingError::Conflict`] if another lot sits at the same
    /// coordinates; [`ParkingError::PersistenceError`] on storage failure.
    async fn create_parking_lot(&self, lot: NewParkingLot) -> Result<ParkingLot, ParkingError>;

    /// Returns the lot with `id`, if any.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn get_parking_lot(&self, id: ParkingLotId) -> Result<Option<ParkingLot>, ParkingError>;

    /// Returns every lot ordered by id.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn list_parking_lots(&self) -> Result<Vec<ParkingLot>, ParkingError>;

    /// Returns the lots owned by `owner` ordered by id.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn list_parking_lots_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<ParkingLot>, ParkingError>;

    /// Saves name, address and coordinates of an existing lot.
    ///
    /// # Errors
    ///
    /// [`ParkingError::ParkingLotNotFound`] if the lot is gone;
    /// [`ParkingError::Conflict`] on a coordinate clash;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn update_parking_lot(&self, lot: &ParkingLot) -> Result<(), ParkingError>;

    /// Tombstones a lot together with its live sensors, atomically.
    /// Returns `false` if the lot did not exist.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn delete_parking_lot(&self, id: ParkingLotId) -> Result<bool, ParkingError>;

    // ── Sensors ─────────────────────────────────────────────────────────

    /// Persists a new sensor.
    ///
    /// # Errors
    ///
    /// [`ParkingError::Conflict`] if the device already has a sensor with
    /// that number; [`ParkingError::PersistenceError`] on storage failure.
    async fn create_sensor(&self, sensor: NewSensor) -> Result<Sensor, ParkingError>;

    /// Returns the sensor with `id`, if any.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn get_sensor(&self, id: SensorId) -> Result<Option<Sensor>, ParkingError>;

    /// Finds a sensor by its device identifier and device-local number.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn find_sensor_by_device(
        &self,
        device_identifier: &str,
        sensor_number: i32,
    ) -> Result<Option<Sensor>, ParkingError>;

    /// Returns every sensor of a lot ordered by id.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn list_sensors_by_lot(&self, lot: ParkingLotId) -> Result<Vec<Sensor>, ParkingError>;

    /// Returns every sensor wired to a device ordered by id.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn list_sensors_by_device(&self, device: DeviceId)
    -> Result<Vec<Sensor>, ParkingError>;

    /// Sets a sensor's status and returns the updated sensor.
    ///
    /// # Errors
    ///
    /// [`ParkingError::SensorNotFound`] if the sensor is gone;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn update_sensor_status(
        &self,
        id: SensorId,
        status: SensorStatus,
    ) -> Result<Sensor, ParkingError>;

    /// Tombstones a sensor. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn delete_sensor(&self, id: SensorId) -> Result<bool, ParkingError>;

    /// Counts free sensors grouped by lot. Lots without free sensors are
    /// absent from the result.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn count_free_sensors_by_lot(&self) -> Result<HashMap<ParkingLotId, u32>, ParkingError>;

    // ── Devices ─────────────────────────────────────────────────────────

    /// Persists a new device.
    ///
    /// # Errors
    ///
    /// [`ParkingError::Conflict`] if the identifier is taken;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn create_device(&self, device_identifier: &str) -> Result<Esp32Device, ParkingError>;

    /// Returns the device with `id`, if any.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn get_device(&self, id: DeviceId) -> Result<Option<Esp32Device>, ParkingError>;

    /// Returns the device reporting as `device_identifier`, if any.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn find_device_by_identifier(
        &self,
        device_identifier: &str,
    ) -> Result<Option<Esp32Device>, ParkingError>;

    /// Returns every device ordered by id.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn list_devices(&self) -> Result<Vec<Esp32Device>, ParkingError>;

    /// Saves a device's identifier.
    ///
    /// # Errors
    ///
    /// [`ParkingError::DeviceNotFound`] if the device is gone;
    /// [`ParkingError::Conflict`] if the identifier is taken;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn update_device(&self, device: &Esp32Device) -> Result<(), ParkingError>;

    /// Records that a device reported at `at`.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn touch_device(&self, id: DeviceId, at: DateTime<Utc>) -> Result<(), ParkingError>;

    /// Deletes a device. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// [`ParkingError::Conflict`] while live sensors reference it;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn delete_device(&self, id: DeviceId) -> Result<bool, ParkingError>;

    // ── Admins ──────────────────────────────────────────────────────────

    /// Persists a new admin with an empty profile.
    ///
    /// # Errors
    ///
    /// [`ParkingError::Conflict`] if the subject is already registered;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn create_admin(&self, subject: &str) -> Result<Admin, ParkingError>;

    /// Returns the admin registered for `subject`, if any.
    ///
    /// # Errors
    ///
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn find_admin_by_subject(&self, subject: &str) -> Result<Option<Admin>, ParkingError>;

    /// Saves an admin's profile fields.
    ///
    /// # Errors
    ///
    /// [`ParkingError::AdminNotFound`] if the admin is gone;
    /// [`ParkingError::PersistenceError`] on storage failure.
    async fn update_admin(&self, admin: &Admin) -> Result<(), ParkingError>;
}
