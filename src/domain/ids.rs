//! Type-safe entity identifiers.
//!
//! Every persisted entity is keyed by a `BIGSERIAL` column. The newtypes
//! below wrap that `i64` so a sensor id cannot be passed where a parking lot
//! id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a parking lot.
    ParkingLotId
);
entity_id!(
    /// Identifier of a single occupancy sensor.
    SensorId
);
entity_id!(
    /// Identifier of an ESP32 reporting device.
    DeviceId
);
entity_id!(
    /// Identifier of an admin account.
    AdminId
);
