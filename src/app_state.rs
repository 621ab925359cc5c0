//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::auth::TokenVerifier;
use crate::config::AuthConfig;
use crate::hub::BroadcastHub;
use crate::persistence::OccupancyStore;
use crate::service::{
    AdminService, AvailabilityAggregator, DeviceService, ParkingLotService, SensorService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Parking lot operations.
    pub lots: Arc<ParkingLotService>,
    /// Sensor operations.
    pub sensors: Arc<SensorService>,
    /// Device registry operations.
    pub devices: Arc<DeviceService>,
    /// Admin account operations.
    pub admins: Arc<AdminService>,
    /// Hub that owns every viewer connection.
    pub hub: BroadcastHub,
    /// Bearer-token verifier.
    pub verifier: Arc<TokenVerifier>,
    /// Greeting sent to viewers on connect.
    pub welcome_message: Arc<str>,
}

impl AppState {
    /// Wires every service over `store` and `hub`.
    #[must_use]
    pub fn new(
        store: Arc<dyn OccupancyStore>,
        hub: BroadcastHub,
        auth: &AuthConfig,
        welcome_message: &str,
    ) -> Self {
        let availability = AvailabilityAggregator::new(Arc::clone(&store));
        Self {
            lots: Arc::new(ParkingLotService::new(
                Arc::clone(&store),
                availability,
                hub.clone(),
            )),
            sensors: Arc::new(SensorService::new(Arc::clone(&store), hub.clone())),
            devices: Arc::new(DeviceService::new(Arc::clone(&store))),
            admins: Arc::new(AdminService::new(store)),
            hub,
            verifier: Arc::new(TokenVerifier::new(auth)),
            welcome_message: Arc::from(welcome_message),
        }
    }
}
