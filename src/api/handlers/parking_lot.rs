//! Parking lot handlers: public listing and owner-scoped CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::Manager;
use crate::api::dto::{ParkingLotDto, ParkingLotRequest, StatusResponse};
use crate::app_state::AppState;
use crate::domain::ParkingLotId;
use crate::error::{ErrorResponse, ParkingError};

/// `GET /parking-lots`: Every lot with its free-space count.
///
/// # Errors
///
/// Returns [`ParkingError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/parking-lots",
    tag = "Parking lots",
    summary = "List parking lots",
    description = "Returns every live parking lot with its current number of available spaces.",
    responses(
        (status = 200, description = "Lots with availability", body = Vec<ParkingLotDto>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_parking_lots(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ParkingError> {
    let lots = state.lots.list().await?;
    Ok(Json(
        lots.into_iter().map(ParkingLotDto::from).collect::<Vec<_>>(),
    ))
}

/// `POST /parking-lots`: Register a lot owned by the caller.
///
/// # Errors
///
/// Returns [`ParkingError`] on invalid input or a coordinate clash.
#[utoipa::path(
    post,
    path = "/api/v1/parking-lots",
    tag = "Parking lots",
    summary = "Create a parking lot",
    request_body = ParkingLotRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Lot created", body = StatusResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Role not allowed", body = ErrorResponse),
        (status = 409, description = "A lot already exists at these coordinates", body = ErrorResponse),
    )
)]
pub async fn create_parking_lot(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Json(req): Json<ParkingLotRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    let lot = state.lots.create(&caller, req.into_new()).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::created("parking lot created", lot.id)),
    ))
}

/// `GET /parking-lots/{id}`: A lot the caller manages.
///
/// # Errors
///
/// Returns [`ParkingError`] if the lot is missing or not the caller's.
#[utoipa::path(
    get,
    path = "/api/v1/parking-lots/{id}",
    tag = "Parking lots",
    summary = "Get a parking lot",
    params(("id" = i64, Path, description = "Parking lot id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Lot with availability", body = ParkingLotDto),
        (status = 403, description = "Caller does not manage the lot", body = ErrorResponse),
        (status = 404, description = "Lot not found", body = ErrorResponse),
    )
)]
pub async fn get_parking_lot(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ParkingError> {
    let lot = state.lots.get(&caller, ParkingLotId::new(id)).await?;
    Ok(Json(ParkingLotDto::from(lot)))
}

/// `PUT /parking-lots/{id}`: Replace a lot's details.
///
/// # Errors
///
/// Returns [`ParkingError`] on invalid input, missing lot, foreign lot or
/// coordinate clash.
#[utoipa::path(
    put,
    path = "/api/v1/parking-lots/{id}",
    tag = "Parking lots",
    summary = "Update a parking lot",
    params(("id" = i64, Path, description = "Parking lot id")),
    request_body = ParkingLotRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Lot updated", body = StatusResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller does not manage the lot", body = ErrorResponse),
        (status = 404, description = "Lot not found", body = ErrorResponse),
        (status = 409, description = "Coordinate clash", body = ErrorResponse),
    )
)]
pub async fn update_parking_lot(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Path(id): Path<i64>,
    Json(req): Json<ParkingLotRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    state
        .lots
        .update(&caller, ParkingLotId::new(id), req.into_update())
        .await?;
    Ok(Json(StatusResponse::new("parking lot updated")))
}

/// `DELETE /parking-lots/{id}`: Tombstone a lot.
///
/// # Errors
///
/// Returns [`ParkingError`] if the lot is missing or not the caller's.
#[utoipa::path(
    delete,
    path = "/api/v1/parking-lots/{id}",
    tag = "Parking lots",
    summary = "Delete a parking lot",
    params(("id" = i64, Path, description = "Parking lot id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Lot deleted", body = StatusResponse),
        (status = 403, description = "Caller does not manage the lot", body = ErrorResponse),
        (status = 404, description = "Lot not found", body = ErrorResponse),
    )
)]
pub async fn delete_parking_lot(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ParkingError> {
    state.lots.delete(&caller, ParkingLotId::new(id)).await?;
    Ok(Json(StatusResponse::new("parking lot deleted")))
}

/// Parking lot routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/parking-lots",
            get(list_parking_lots).post(create_parking_lot),
        )
        .route(
            "/parking-lots/{id}",
            get(get_parking_lot)
                .put(update_parking_lot)
                .delete(delete_parking_lot),
        )
}
