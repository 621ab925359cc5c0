//! OpenAPI document for the REST surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::{admin, device, parking_lot, sensor, system};

/// Generated OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "parking-radar-gateway",
        description = "Parking-lot occupancy API. Live changes are pushed over `GET /ws`."
    ),
    paths(
        system::health_handler,
        parking_lot::list_parking_lots,
        parking_lot::create_parking_lot,
        parking_lot::get_parking_lot,
        parking_lot::update_parking_lot,
        parking_lot::delete_parking_lot,
        sensor::create_sensor,
        sensor::list_sensors,
        sensor::get_sensor,
        sensor::report_sensor,
        sensor::update_sensor,
        sensor::delete_sensor,
        device::register_device,
        device::list_devices,
        device::get_device,
        device::update_device,
        device::delete_device,
        admin::register_admin,
        admin::complete_profile,
        admin::get_profile,
        admin::list_owned_parking_lots,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Health"),
        (name = "Parking lots", description = "Lots and their availability"),
        (name = "Sensors", description = "Sensors and device status reports"),
        (name = "Devices", description = "ESP32 reporting devices"),
        (name = "Admins", description = "Admin accounts"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
