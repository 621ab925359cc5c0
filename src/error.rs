//! Gateway error types with HTTP status code mapping.
//!
//! [`ParkingError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Notification delivery problems live in [`crate::hub::HubError`] and never
//! surface here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ParkingLotId, SensorId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1201,
///     "message": "forbidden: you don't have access to parking lot 4"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`ParkingError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                   |
/// |-----------|-----------------|-------------------------------|
/// | 1000–1099 | Validation      | 400 Bad Request               |
/// | 1100–1199 | Authentication  | 401 Unauthorized              |
/// | 1200–1299 | Authorization   | 403 Forbidden                 |
/// | 2000–2099 | Not Found       | 404 Not Found                 |
/// | 2100–2199 | State           | 409 Conflict                  |
/// | 3000–3999 | Server          | 500 Internal Server Error     |
#[derive(Debug, thiserror::Error)]
pub enum ParkingError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Sensor status outside the `free` / `occupied` vocabulary.
    #[error("invalid sensor status: {0:?} (expected \"free\" or \"occupied\")")]
    InvalidSensorStatus(String),

    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to act on the target.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Parking lot with the given ID was not found.
    #[error("parking lot not found: {0}")]
    ParkingLotNotFound(ParkingLotId),

    /// Sensor was not found.
    #[error("sensor not found: {0}")]
    SensorNotFound(String),

    /// Device was not found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Admin account was not found.
    #[error("admin not found: {0}")]
    AdminNotFound(String),

    /// Unique or referential constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParkingError {
    /// Builds a [`ParkingError::SensorNotFound`] for a sensor id.
    #[must_use]
    pub fn sensor_not_found(id: SensorId) -> Self {
        Self::SensorNotFound(format!("id {id}"))
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidSensorStatus(_) => 1002,
            Self::Unauthorized(_) => 1101,
            Self::Forbidden(_) => 1201,
            Self::ParkingLotNotFound(_) => 2001,
            Self::SensorNotFound(_) => 2002,
            Self::DeviceNotFound(_) => 2003,
            Self::AdminNotFound(_) => 2004,
            Self::Conflict(_) => 2101,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidSensorStatus(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ParkingLotNotFound(_)
            | Self::SensorNotFound(_)
            | Self::DeviceNotFound(_)
            | Self::AdminNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ParkingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
