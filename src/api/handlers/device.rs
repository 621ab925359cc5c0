//! ESP32 device handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::Manager;
use crate::api::dto::{DeviceDetailDto, DeviceDto, DeviceRequest, StatusResponse};
use crate::app_state::AppState;
use crate::domain::DeviceId;
use crate::error::{ErrorResponse, ParkingError};

/// `POST /esp32-devices/register`: Register a device.
///
/// # Errors
///
/// Returns [`ParkingError`] for a blank or duplicate identifier.
#[utoipa::path(
    post,
    path = "/api/v1/esp32-devices/register",
    tag = "Devices",
    summary = "Register a device",
    request_body = DeviceRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Device registered", body = StatusResponse),
        (status = 400, description = "Blank identifier", body = ErrorResponse),
        (status = 409, description = "Identifier already registered", body = ErrorResponse),
    )
)]
pub async fn register_device(
    State(state): State<AppState>,
    Manager(_caller): Manager,
    Json(req): Json<DeviceRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    let device = state.devices.register(&req.device_identifier).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::created("esp32 device created", device.id)),
    ))
}

/// `GET /esp32-devices/list`: Every device.
///
/// # Errors
///
/// Returns [`ParkingError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/esp32-devices/list",
    tag = "Devices",
    summary = "List devices",
    responses(
        (status = 200, description = "Registered devices", body = Vec<DeviceDto>),
    )
)]
pub async fn list_devices(State(state): State<AppState>) -> Result<impl IntoResponse, ParkingError> {
    let devices = state.devices.list().await?;
    Ok(Json(
        devices.into_iter().map(DeviceDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /esp32-devices/{id}`: A device with its sensors.
///
/// # Errors
///
/// Returns [`ParkingError::DeviceNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/esp32-devices/{id}",
    tag = "Devices",
    summary = "Get a device",
    params(("id" = i64, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device with sensors", body = DeviceDetailDto),
        (status = 404, description = "Device not found", body = ErrorResponse),
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ParkingError> {
    let detail = state.devices.get(DeviceId::new(id)).await?;
    Ok(Json(DeviceDetailDto::from(detail)))
}

/// `PUT /esp32-devices/{id}`: Rename a device.
///
/// # Errors
///
/// Returns [`ParkingError`] for a missing device or a taken identifier.
#[utoipa::path(
    put,
    path = "/api/v1/esp32-devices/{id}",
    tag = "Devices",
    summary = "Update a device",
    params(("id" = i64, Path, description = "Device id")),
    request_body = DeviceRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Device updated", body = StatusResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 409, description = "Identifier already registered", body = ErrorResponse),
    )
)]
pub async fn update_device(
    State(state): State<AppState>,
    Manager(_caller): Manager,
    Path(id): Path<i64>,
    Json(req): Json<DeviceRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    state
        .devices
        .update(DeviceId::new(id), &req.device_identifier)
        .await?;
    Ok(Json(StatusResponse::new("esp32 device updated")))
}

/// `DELETE /esp32-devices/{id}`: Delete a device without sensors.
///
/// # Errors
///
/// Returns [`ParkingError`] for a missing device or while sensors remain.
#[utoipa::path(
    delete,
    path = "/api/v1/esp32-devices/{id}",
    tag = "Devices",
    summary = "Delete a device",
    params(("id" = i64, Path, description = "Device id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Device deleted", body = StatusResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 409, description = "Device still has sensors", body = ErrorResponse),
    )
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Manager(_caller): Manager,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ParkingError> {
    state.devices.delete(DeviceId::new(id)).await?;
    Ok(Json(StatusResponse::new("esp32 device deleted")))
}

/// Device routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/esp32-devices/register", post(register_device))
        .route("/esp32-devices/list", get(list_devices))
        .route(
            "/esp32-devices/{id}",
            get(get_device).put(update_device).delete(delete_device),
        )
}
