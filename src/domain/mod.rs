//! Domain layer: entities, identifiers, caller identity and change events.
//!
//! This module contains the server-side model of the occupancy domain:
//! parking lots, sensors and their status vocabulary, reporting devices,
//! admin accounts, the resolved request [`Caller`], and the [`ChangeEvent`]
//! contract consumed by the broadcast hub.

pub mod admin;
pub mod caller;
pub mod change_event;
pub mod device;
pub mod ids;
pub mod parking_lot;
pub mod sensor;

pub use admin::{Admin, AdminProfile};
pub use caller::Caller;
pub use change_event::ChangeEvent;
pub use device::Esp32Device;
pub use ids::{AdminId, DeviceId, ParkingLotId, SensorId};
pub use parking_lot::{NewParkingLot, ParkingLot, ParkingLotUpdate};
pub use sensor::{NewSensor, Sensor, SensorStatus};
