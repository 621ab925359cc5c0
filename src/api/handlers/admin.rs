//! Admin account handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::{Manager, Registrant};
use crate::api::dto::{AdminDto, CompleteProfileRequest, ParkingLotDto, StatusResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ParkingError};

/// `POST /admins/register`: Register the caller as an admin.
///
/// # Errors
///
/// Returns [`ParkingError::Conflict`] if already registered.
#[utoipa::path(
    post,
    path = "/api/v1/admins/register",
    tag = "Admins",
    summary = "Register as admin",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Admin registered", body = StatusResponse),
        (status = 403, description = "Role not allowed", body = ErrorResponse),
        (status = 409, description = "Already registered", body = ErrorResponse),
    )
)]
pub async fn register_admin(
    State(state): State<AppState>,
    Registrant(caller): Registrant,
) -> Result<impl IntoResponse, ParkingError> {
    let admin = state.admins.register(&caller).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::created("admin registered", admin.id)),
    ))
}

/// `POST /admins/complete-profile`: Fill in the caller's profile.
///
/// # Errors
///
/// Returns [`ParkingError::AdminNotFound`] if the caller never registered.
#[utoipa::path(
    post,
    path = "/api/v1/admins/complete-profile",
    tag = "Admins",
    summary = "Complete admin profile",
    request_body = CompleteProfileRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile saved", body = AdminDto),
        (status = 404, description = "Admin not registered", body = ErrorResponse),
    )
)]
pub async fn complete_profile(
    State(state): State<AppState>,
    Manager(caller): Manager,
    Json(req): Json<CompleteProfileRequest>,
) -> Result<impl IntoResponse, ParkingError> {
    let admin = state.admins.complete_profile(&caller, req.into()).await?;
    Ok(Json(AdminDto::from(admin)))
}

/// `GET /admins/profile`: The caller's admin record.
///
/// # Errors
///
/// Returns [`ParkingError::AdminNotFound`] if the caller never registered.
#[utoipa::path(
    get,
    path = "/api/v1/admins/profile",
    tag = "Admins",
    summary = "Get admin profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Admin profile", body = AdminDto),
        (status = 404, description = "Admin not registered", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Manager(caller): Manager,
) -> Result<impl IntoResponse, ParkingError> {
    let admin = state.admins.profile(&caller).await?;
    Ok(Json(AdminDto::from(admin)))
}

/// `GET /admins/parking-lots`: Lots owned by the caller.
///
/// # Errors
///
/// Returns [`ParkingError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/admins/parking-lots",
    tag = "Admins",
    summary = "List the caller's parking lots",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Owned lots with availability", body = Vec<ParkingLotDto>),
    )
)]
pub async fn list_owned_parking_lots(
    State(state): State<AppState>,
    Manager(caller): Manager,
) -> Result<impl IntoResponse, ParkingError> {
    let lots = state.lots.list_owned(&caller).await?;
    Ok(Json(
        lots.into_iter().map(ParkingLotDto::from).collect::<Vec<_>>(),
    ))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admins/register", post(register_admin))
        .route("/admins/complete-profile", post(complete_profile))
        .route("/admins/profile", get(get_profile))
        .route("/admins/parking-lots", get(list_owned_parking_lots))
}
