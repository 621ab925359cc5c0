//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod device;
pub mod parking_lot;
pub mod sensor;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(parking_lot::routes())
        .merge(sensor::routes())
        .merge(device::routes())
        .merge(admin::routes())
}
