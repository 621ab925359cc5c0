//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers are exposed as plain integers; sensor statuses as the
//! strings `"free"` and `"occupied"`.

pub mod admin_dto;
pub mod common_dto;
pub mod device_dto;
pub mod parking_lot_dto;
pub mod sensor_dto;

pub use admin_dto::*;
pub use common_dto::*;
pub use device_dto::*;
pub use parking_lot_dto::*;
pub use sensor_dto::*;
