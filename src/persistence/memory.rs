//! In-process occupancy store.
//!
//! [`MemoryStore`] keeps every table in a single `RwLock`-guarded set of
//! ordered maps. It enforces the same uniqueness and tombstone rules as
//! the PostgreSQL schema, so services behave identically on either
//! backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::OccupancyStore;
use crate::domain::{
    Admin, AdminId, DeviceId, Esp32Device, NewParkingLot, NewSensor, ParkingLot, ParkingLotId,
    Sensor, SensorId, SensorStatus,
};
use crate::error::ParkingError;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    lots: BTreeMap<ParkingLotId, ParkingLot>,
    sensors: BTreeMap<SensorId, Sensor>,
    devices: BTreeMap<DeviceId, Esp32Device>,
    admins: BTreeMap<AdminId, Admin>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn live_lots(&self) -> impl Iterator<Item = &ParkingLot> {
        self.lots.values().filter(|lot| lot.deleted_at.is_none())
    }

    fn live_sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values().filter(|s| s.deleted_at.is_none())
    }

    fn coordinates_taken(&self, latitude: f64, longitude: f64, except: Option<ParkingLotId>) -> bool {
        self.live_lots().any(|lot| {
            Some(lot.id) != except && lot.latitude == latitude && lot.longitude == longitude
        })
    }

    /// Returns a sensor with its device identifier resolved from the
    /// device table.
    fn hydrate(&self, sensor: &Sensor) -> Sensor {
        let mut sensor = sensor.clone();
        if let Some(device) = self.devices.get(&sensor.device_id) {
            sensor.device_identifier.clone_from(&device.device_identifier);
        }
        sensor
    }
}

/// Occupancy store held entirely in memory.
///
/// Identifiers come from one shared counter, so ids are unique across
/// tables as well as within them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OccupancyStore for MemoryStore {
    async fn create_parking_lot(&self, lot: NewParkingLot) -> Result<ParkingLot, ParkingError> {
        let mut tables = self.tables.write().await;
        if tables.coordinates_taken(lot.latitude, lot.longitude, None) {
            return Err(ParkingError::Conflict(
                "parking lot already exists at these coordinates".to_string(),
            ));
        }
        let now = Utc::now();
        let id = ParkingLotId::new(tables.allocate_id());
        let created = ParkingLot {
            id,
            name: lot.name,
            address: lot.address,
            latitude: lot.latitude,
            longitude: lot.longitude,
            owner: lot.owner,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.lots.insert(id, created.clone());
        Ok(created)
    }

    async fn get_parking_lot(&self, id: ParkingLotId) -> Result<Option<ParkingLot>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables.live_lots().find(|lot| lot.id == id).cloned())
    }

    async fn list_parking_lots(&self) -> Result<Vec<ParkingLot>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables.live_lots().cloned().collect())
    }

    async fn list_parking_lots_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<ParkingLot>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_lots()
            .filter(|lot| lot.owner == owner)
            .cloned()
            .collect())
    }

    async fn update_parking_lot(&self, lot: &ParkingLot) -> Result<(), ParkingError> {
        let mut tables = self.tables.write().await;
        if tables.coordinates_taken(lot.latitude, lot.longitude, Some(lot.id)) {
            return Err(ParkingError::Conflict(
                "another parking lot exists at these coordinates".to_string(),
            ));
        }
        let Some(stored) = tables
            .lots
            .get_mut(&lot.id)
            .filter(|stored| stored.deleted_at.is_none())
        else {
            return Err(ParkingError::ParkingLotNotFound(lot.id));
        };
        stored.name.clone_from(&lot.name);
        stored.address.clone_from(&lot.address);
        stored.latitude = lot.latitude;
        stored.longitude = lot.longitude;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_parking_lot(&self, id: ParkingLotId) -> Result<bool, ParkingError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        match tables.lots.get_mut(&id) {
            Some(lot) if lot.deleted_at.is_none() => lot.deleted_at = Some(now),
            _ => return Ok(false),
        }
        for sensor in tables.sensors.values_mut() {
            if sensor.parking_lot_id == id && sensor.deleted_at.is_none() {
                sensor.deleted_at = Some(now);
            }
        }
        Ok(true)
    }

    async fn create_sensor(&self, sensor: NewSensor) -> Result<Sensor, ParkingError> {
        let mut tables = self.tables.write().await;
        if !tables.live_lots().any(|lot| lot.id == sensor.parking_lot_id) {
            return Err(ParkingError::Conflict(format!(
                "parking lot {} does not exist",
                sensor.parking_lot_id
            )));
        }
        let Some(device) = tables.devices.get(&sensor.device_id) else {
            return Err(ParkingError::Conflict(format!(
                "device {} does not exist",
                sensor.device_id
            )));
        };
        let device_identifier = device.device_identifier.clone();
        let duplicate = tables.live_sensors().any(|s| {
            s.device_id == sensor.device_id && s.sensor_number == sensor.sensor_number
        });
        if duplicate {
            return Err(ParkingError::Conflict(
                "sensor number already registered on this device".to_string(),
            ));
        }

        let now = Utc::now();
        let id = SensorId::new(tables.allocate_id());
        let created = Sensor {
            id,
            parking_lot_id: sensor.parking_lot_id,
            device_id: sensor.device_id,
            device_identifier,
            sensor_number: sensor.sensor_number,
            status: sensor.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.sensors.insert(id, created.clone());
        Ok(created)
    }

    async fn get_sensor(&self, id: SensorId) -> Result<Option<Sensor>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_sensors()
            .find(|s| s.id == id)
            .map(|s| tables.hydrate(s)))
    }

    async fn find_sensor_by_device(
        &self,
        device_identifier: &str,
        sensor_number: i32,
    ) -> Result<Option<Sensor>, ParkingError> {
        let tables = self.tables.read().await;
        let Some(device_id) = tables
            .devices
            .values()
            .find(|d| d.device_identifier == device_identifier)
            .map(|d| d.id)
        else {
            return Ok(None);
        };
        Ok(tables
            .live_sensors()
            .find(|s| s.device_id == device_id && s.sensor_number == sensor_number)
            .map(|s| tables.hydrate(s)))
    }

    async fn list_sensors_by_lot(&self, lot: ParkingLotId) -> Result<Vec<Sensor>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_sensors()
            .filter(|s| s.parking_lot_id == lot)
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn list_sensors_by_device(
        &self,
        device: DeviceId,
    ) -> Result<Vec<Sensor>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_sensors()
            .filter(|s| s.device_id == device)
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn update_sensor_status(
        &self,
        id: SensorId,
        status: SensorStatus,
    ) -> Result<Sensor, ParkingError> {
        let mut tables = self.tables.write().await;
        let Some(sensor) = tables
            .sensors
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none())
        else {
            return Err(ParkingError::sensor_not_found(id));
        };
        sensor.status = status;
        sensor.updated_at = Utc::now();
        let updated = sensor.clone();
        Ok(tables.hydrate(&updated))
    }

    async fn delete_sensor(&self, id: SensorId) -> Result<bool, ParkingError> {
        let mut tables = self.tables.write().await;
        match tables.sensors.get_mut(&id) {
            Some(sensor) if sensor.deleted_at.is_none() => {
                sensor.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_free_sensors_by_lot(&self) -> Result<HashMap<ParkingLotId, u32>, ParkingError> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for sensor in tables.live_sensors().filter(|s| s.status.is_free()) {
            *counts.entry(sensor.parking_lot_id).or_insert(0_u32) += 1;
        }
        Ok(counts)
    }

    async fn create_device(&self, device_identifier: &str) -> Result<Esp32Device, ParkingError> {
        let mut tables = self.tables.write().await;
        if tables
            .devices
            .values()
            .any(|d| d.device_identifier == device_identifier)
        {
            return Err(ParkingError::Conflict(
                "device identifier already registered".to_string(),
            ));
        }
        let id = DeviceId::new(tables.allocate_id());
        let device = Esp32Device {
            id,
            device_identifier: device_identifier.to_string(),
            last_communication: None,
        };
        tables.devices.insert(id, device.clone());
        Ok(device)
    }

    async fn get_device(&self, id: DeviceId) -> Result<Option<Esp32Device>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables.devices.get(&id).cloned())
    }

    async fn find_device_by_identifier(
        &self,
        device_identifier: &str,
    ) -> Result<Option<Esp32Device>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .devices
            .values()
            .find(|d| d.device_identifier == device_identifier)
            .cloned())
    }

    async fn list_devices(&self) -> Result<Vec<Esp32Device>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables.devices.values().cloned().collect())
    }

    async fn update_device(&self, device: &Esp32Device) -> Result<(), ParkingError> {
        let mut tables = self.tables.write().await;
        if tables
            .devices
            .values()
            .any(|d| d.id != device.id && d.device_identifier == device.device_identifier)
        {
            return Err(ParkingError::Conflict(
                "device identifier already registered".to_string(),
            ));
        }
        let Some(stored) = tables.devices.get_mut(&device.id) else {
            return Err(ParkingError::DeviceNotFound(format!("id {}", device.id)));
        };
        stored.device_identifier.clone_from(&device.device_identifier);
        Ok(())
    }

    async fn touch_device(&self, id: DeviceId, at: DateTime<Utc>) -> Result<(), ParkingError> {
        let mut tables = self.tables.write().await;
        if let Some(device) = tables.devices.get_mut(&id) {
            device.last_communication = Some(at);
        }
        Ok(())
    }

    async fn delete_device(&self, id: DeviceId) -> Result<bool, ParkingError> {
        let mut tables = self.tables.write().await;
        let live = tables.live_sensors().filter(|s| s.device_id == id).count();
        if live > 0 {
            return Err(ParkingError::Conflict(format!(
                "device {id} still has {live} sensor(s)"
            )));
        }
        if tables.devices.remove(&id).is_none() {
            return Ok(false);
        }
        tables.sensors.retain(|_, s| s.device_id != id);
        Ok(true)
    }

    async fn create_admin(&self, subject: &str) -> Result<Admin, ParkingError> {
        let mut tables = self.tables.write().await;
        if tables.admins.values().any(|a| a.subject == subject) {
            return Err(ParkingError::Conflict("admin already registered".to_string()));
        }
        let now = Utc::now();
        let id = AdminId::new(tables.allocate_id());
        let admin = Admin {
            id,
            subject: subject.to_string(),
            nit: String::new(),
            photo_url: String::new(),
            contact_phone: String::new(),
            created_at: now,
            updated_at: now,
        };
        tables.admins.insert(id, admin.clone());
        Ok(admin)
    }

    async fn find_admin_by_subject(&self, subject: &str) -> Result<Option<Admin>, ParkingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .admins
            .values()
            .find(|a| a.subject == subject)
            .cloned())
    }

    async fn update_admin(&self, admin: &Admin) -> Result<(), ParkingError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.admins.get_mut(&admin.id) else {
            return Err(ParkingError::AdminNotFound(admin.subject.clone()));
        };
        stored.nit.clone_from(&admin.nit);
        stored.photo_url.clone_from(&admin.photo_url);
        stored.contact_phone.clone_from(&admin.contact_phone);
        stored.updated_at = Utc::now();
        Ok(())
    }
}
