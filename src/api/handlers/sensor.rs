//! Sensor handlers: admin management and the device report endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::auth::Manager;
use crate::api::dto::{
    CreateSensorRequest, SensorDto, SensorListParams, SensorReportRequest, SensorStatusRequest,
    StatusResponse,
};
use crate::app_state::AppState;
use crate::domain::{ParkingLotId, SensorId, SensorStatus};
use crate::error::{ErrorResponse, ParkingError};

/// `POST /sensors`: Register a sensor in a lot the caller manages.
///
/// # Errors
///
/// Returns [`ParkingError`] on an invalid status, unknown device, foreign
/// lot or duplicate sensor number.
#[utoipa::path(
    post,
    path = "/api/v1/sensors",
    tag = "Sensors",
    summary = "Create a sensor",
    request_body = CreateSensorRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Sensor created", body = StatusResponse),
        (status = 400, description = "Invalid status or request", body = ErrorResponse),
        (status = 403, description = "Caller does not manage the lot", body = ErrorResponse),
        (status = 404, description = "Lot or device not found", body = ErrorResponse),
        (status = 409, description = "Sensor number already used on the device", body = ErrorResponse),
    )
)]
pub async fn create_sensor(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Json(req): Json<CreateSensorRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    let sensor = state.sensors.create(&caller, req.into_request()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::created("sensor created", sensor.id)),
    ))
}

/// `GET /sensors?parking_lot_id=`: Sensors of one lot.
///
/// # Errors
///
/// Returns [`ParkingError`] if the lot does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/sensors",
    tag = "Sensors",
    summary = "List sensors of a lot",
    params(SensorListParams),
    responses(
        (status = 200, description = "Sensors of the lot", body = Vec<SensorDto>),
        (status = 404, description = "Lot not found", body = ErrorResponse),
    )
)]
pub async fn list_sensors(
    State(state): State<AppState>,
    Query(params): Query<SensorListParams>,
) -> Result<impl IntoResponse, ParkingError> {
    let sensors = state
        .sensors
        .list_by_lot(ParkingLotId::new(params.parking_lot_id))
        .await?;
    Ok(Json(
        sensors.into_iter().map(SensorDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /sensors/{id}`: One sensor.
///
/// # Errors
///
/// Returns [`ParkingError::SensorNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/sensors/{id}",
    tag = "Sensors",
    summary = "Get a sensor",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor", body = SensorDto),
        (status = 404, description = "Sensor not found", body = ErrorResponse),
    )
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ParkingError> {
    let sensor = state.sensors.get(SensorId::new(id)).await?;
    Ok(Json(SensorDto::from(sensor)))
}

/// `PUT /sensors/report`: Status report from a device.
///
/// # Errors
///
/// Returns [`ParkingError`] on an invalid status or unknown sensor.
#[utoipa::path(
    put,
    path = "/api/v1/sensors/report",
    tag = "Sensors",
    summary = "Report sensor status",
    description = "Called by ESP32 devices. The sensor is located by device identifier and sensor number.",
    request_body = SensorReportRequest,
    responses(
        (status = 200, description = "Status applied", body = StatusResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 404, description = "Sensor not found", body = ErrorResponse),
    )
)]
pub async fn report_sensor(
    State(state): State<AppState>,
    Json(req): Json<SensorReportRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    let status: SensorStatus = req.status.parse()?;
    state
        .sensors
        .report(req.device_identifier.trim(), req.sensor_number, status)
        .await?;
    Ok(Json(StatusResponse::new("sensor updated")))
}

/// `PUT /sensors/{id}`: Admin status override.
///
/// # Errors
///
/// Returns [`ParkingError`] on an invalid status, missing sensor or
/// foreign lot.
#[utoipa::path(
    put,
    path = "/api/v1/sensors/{id}",
    tag = "Sensors",
    summary = "Update a sensor's status",
    params(("id" = i64, Path, description = "Sensor id")),
    request_body = SensorStatusRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Status applied", body = StatusResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 403, description = "Caller does not manage the lot", body = ErrorResponse),
        (status = 404, description = "Sensor not found", body = ErrorResponse),
    )
)]
pub async fn update_sensor(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Path(id): Path<i64>,
    Json(req): Json<SensorStatusRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    let status: SensorStatus = req.status.parse()?;
    state
        .sensors
        .update_status(&caller, SensorId::new(id), status)
        .await?;
    Ok(Json(StatusResponse::new("sensor updated")))
}

/// `DELETE /sensors/{id}`: Tombstone a sensor.
///
/// # Errors
///
/// Returns [`ParkingError`] if the sensor is missing or in a foreign lot.
#[utoipa::path(
    delete,
    path = "/api/v1/sensors/{id}",
    tag = "Sensors",
    summary = "Delete a sensor",
    params(("id" = i64, Path, description = "Sensor id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Sensor deleted", body = StatusResponse),
        (status = 403, description = "Caller does not manage the lot", body = ErrorResponse),
        (status = 404, description = "Sensor not found", body = ErrorResponse),
    )
)]
pub async fn delete_sensor(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ParkingError> {
    state.sensors.delete(&caller, SensorId::new(id)).await?;
    Ok(Json(StatusResponse::new("sensor deleted")))
}

/// Sensor routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sensors", get(list_sensors).post(create_sensor))
        .route("/sensors/report", put(report_sensor))
        .route(
            "/sensors/{id}",
            get(get_sensor).put(update_sensor).delete(delete_sensor),
        )
}
