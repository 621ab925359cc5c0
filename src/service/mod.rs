//! Service layer: business logic orchestration.
//!
//! [`ParkingLotService`] and [`SensorService`] persist mutations through the
//! [`crate::persistence::OccupancyStore`] and hand a
//! [`crate::domain::ChangeEvent`] to the [`crate::hub::BroadcastHub`] after
//! every successful write. [`AvailabilityAggregator`] derives free-space
//! counts; [`DeviceService`] and [`AdminService`] manage devices and admin
//! accounts without emitting events.

pub mod admin_service;
pub mod availability;
pub mod device_service;
pub mod parking_lot_service;
pub mod sensor_service;

pub use admin_service::AdminService;
pub use availability::{AvailabilityAggregator, ParkingLotAvailability};
pub use device_service::{DeviceService, DeviceWithSensors};
pub use parking_lot_service::ParkingLotService;
pub use sensor_service::{NewSensorRequest, SensorService};

use crate::domain::{Caller, ParkingLot, ParkingLotId};
use crate::error::ParkingError;
use crate::persistence::OccupancyStore;

/// Loads a live lot and checks that `caller` may mutate it.
async fn load_managed_lot(
    store: &dyn OccupancyStore,
    caller: &Caller,
    id: ParkingLotId,
) -> Result<ParkingLot, ParkingError> {
    let lot = store
        .get_parking_lot(id)
        .await?
        .ok_or(ParkingError::ParkingLotNotFound(id))?;
    caller.ensure_manages(&lot)?;
    Ok(lot)
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod testing {
    //! Service wiring and event observation shared by service tests.

    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::hub::{BroadcastHub, HubError, ViewerConnection};

    pub(crate) struct TestServices {
        pub(crate) lots: ParkingLotService,
        pub(crate) sensors: SensorService,
    }

    /// Builds the event-emitting services over `store` with a running hub.
    pub(crate) fn services(store: Arc<dyn OccupancyStore>) -> (TestServices, BroadcastHub) {
        let hub = BroadcastHub::new(16, 16);
        let runner = hub.clone();
        tokio::spawn(async move { runner.run().await });

        let availability = AvailabilityAggregator::new(Arc::clone(&store));
        let lots = ParkingLotService::new(Arc::clone(&store), availability, hub.clone());
        let sensors = SensorService::new(store, hub.clone());
        (TestServices { lots, sensors }, hub)
    }

    struct ChannelViewer(mpsc::UnboundedSender<String>);

    impl ViewerConnection for ChannelViewer {
        async fn deliver(&mut self, payload: Arc<str>) -> Result<(), HubError> {
            self.0
                .send(payload.to_string())
                .map_err(|e| HubError::Delivery(e.to_string()))
        }

        async fn close(self) {}
    }

    /// A viewer registered with the hub that exposes received change events.
    pub(crate) struct EventProbe {
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl EventProbe {
        pub(crate) async fn attach(hub: &BroadcastHub) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            hub.add_client(ChannelViewer(tx)).await;
            Self { rx }
        }

        /// Returns the `payload` of the next pushed message.
        pub(crate) async fn next(&mut self) -> serde_json::Value {
            let Ok(Some(json)) = tokio::time::timeout(Duration::from_secs(2), self.rx.recv()).await
            else {
                panic!("no change event delivered");
            };
            let Ok(mut message) = serde_json::from_str::<serde_json::Value>(&json) else {
                panic!("invalid json: {json}");
            };
            assert_eq!(
                message.get("type").and_then(|v| v.as_str()),
                Some("new-change-in-parking")
            );
            let Some(payload) = message.get_mut("payload") else {
                panic!("missing payload in {json}");
            };
            payload.take()
        }

        pub(crate) async fn expect_silence(&mut self) {
            let received = tokio::time::timeout(Duration::from_millis(150), self.rx.recv()).await;
            if let Ok(Some(json)) = received {
                panic!("unexpected change event: {json}");
            }
        }
    }
}
