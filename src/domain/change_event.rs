//! Change events emitted after successful lot and sensor mutations.
//!
//! Every persisted mutation of a parking lot or sensor produces a
//! [`ChangeEvent`] that is handed to the [`crate::hub::BroadcastHub`].
//! Events are transient: they are never stored and a viewer that connects
//! later does not see them.

use serde::Serialize;

use super::{ParkingLot, ParkingLotId, Sensor, SensorId, SensorStatus};

/// Details of a created or updated parking lot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotChange {
    /// Lot identifier.
    pub id: ParkingLotId,
    /// Lot name after the change.
    pub name: String,
    /// Lot address after the change.
    pub address: String,
}

/// Details of a created or updated sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorChange {
    /// Sensor identifier.
    pub id: SensorId,
    /// Lot the sensor belongs to.
    pub parking_lot_id: ParkingLotId,
    /// Identifier string of the reporting device.
    pub device_identifier: String,
    /// Device-local sensor index.
    pub sensor_number: i32,
    /// Status after the change.
    pub status: SensorStatus,
}

/// Reference to a deleted entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRef<I> {
    /// Identifier of the deleted entity.
    pub id: I,
}

/// A state change pushed to connected viewers.
///
/// Serializes as `{"event": "<kind>", "details": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "details", rename_all = "kebab-case")]
pub enum ChangeEvent {
    /// A lot was registered.
    ParkingLotCreated(LotChange),
    /// A lot's name, address or coordinates changed.
    ParkingLotUpdated(LotChange),
    /// A lot was tombstoned.
    ParkingLotDeleted(EntityRef<ParkingLotId>),
    /// A sensor was registered.
    SensorCreated(SensorChange),
    /// A sensor's status changed.
    SensorUpdated(SensorChange),
    /// A sensor was tombstoned.
    SensorDeleted(EntityRef<SensorId>),
}

impl ChangeEvent {
    /// Builds a `parking-lot-created` event.
    #[must_use]
    pub fn lot_created(lot: &ParkingLot) -> Self {
        Self::ParkingLotCreated(LotChange::from(lot))
    }

    /// Builds a `parking-lot-updated` event.
    #[must_use]
    pub fn lot_updated(lot: &ParkingLot) -> Self {
        Self::ParkingLotUpdated(LotChange::from(lot))
    }

    /// Builds a `parking-lot-deleted` event.
    #[must_use]
    pub const fn lot_deleted(id: ParkingLotId) -> Self {
        Self::ParkingLotDeleted(EntityRef { id })
    }

    /// Builds a `sensor-created` event.
    #[must_use]
    pub fn sensor_created(sensor: &Sensor) -> Self {
        Self::SensorCreated(SensorChange::from(sensor))
    }

    /// Builds a `sensor-updated` event.
    #[must_use]
    pub fn sensor_updated(sensor: &Sensor) -> Self {
        Self::SensorUpdated(SensorChange::from(sensor))
    }

    /// Builds a `sensor-deleted` event.
    #[must_use]
    pub const fn sensor_deleted(id: SensorId) -> Self {
        Self::SensorDeleted(EntityRef { id })
    }

    /// Returns the event kind tag as a static string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ParkingLotCreated(_) => "parking-lot-created",
            Self::ParkingLotUpdated(_) => "parking-lot-updated",
            Self::ParkingLotDeleted(_) => "parking-lot-deleted",
            Self::SensorCreated(_) => "sensor-created",
            Self::SensorUpdated(_) => "sensor-updated",
            Self::SensorDeleted(_) => "sensor-deleted",
        }
    }
}

impl From<&ParkingLot> for LotChange {
    fn from(lot: &ParkingLot) -> Self {
        Self {
            id: lot.id,
            name: lot.name.clone(),
            address: lot.address.clone(),
        }
    }
}

impl From<&Sensor> for SensorChange {
    fn from(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id,
            parking_lot_id: sensor.parking_lot_id,
            device_identifier: sensor.device_identifier.clone(),
            sensor_number: sensor.sensor_number,
            status: sensor.status,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_serialized_tag() {
        let event = ChangeEvent::lot_deleted(ParkingLotId::new(3));
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value.get("event").and_then(|v| v.as_str()),
            Some(event.kind())
        );
        assert_eq!(
            value.pointer("/details/id").and_then(serde_json::Value::as_i64),
            Some(3)
        );
    }

    #[test]
    fn lot_change_carries_name_and_address() {
        let event = ChangeEvent::ParkingLotUpdated(LotChange {
            id: ParkingLotId::new(1),
            name: "Centro".to_string(),
            address: "Calle 1".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event\":\"parking-lot-updated\""));
        assert!(json.contains("\"name\":\"Centro\""));
        assert!(json.contains("\"address\":\"Calle 1\""));
    }

    #[test]
    fn sensor_change_serializes_status() {
        let event = ChangeEvent::SensorUpdated(SensorChange {
            id: SensorId::new(8),
            parking_lot_id: ParkingLotId::new(1),
            device_identifier: "AA:BB".to_string(),
            sensor_number: 2,
            status: SensorStatus::Free,
        });
        assert_eq!(event.kind(), "sensor-updated");
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"status\":\"free\""));
        assert!(json.contains("\"device_identifier\":\"AA:BB\""));
    }
}
