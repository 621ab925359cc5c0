//! Real-time broadcast hub for occupancy viewers.
//!
//! The hub is the only owner of live viewer connections. Mutation paths
//! publish [`crate::domain::ChangeEvent`]s into it and the WebSocket
//! endpoint registers and deregisters viewers; neither touches the
//! connection set directly.

pub mod broadcast_hub;
pub mod connection;

pub use broadcast_hub::BroadcastHub;
pub use connection::{ClientId, ViewerConnection};

/// Errors raised inside the hub. None of them reach mutation callers.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// [`BroadcastHub::run`] was called on a hub whose loop already started.
    #[error("broadcast hub is already running")]
    AlreadyRunning,

    /// Writing to a viewer failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// A change event could not be serialized.
    #[error("failed to encode change event: {0}")]
    Encode(#[from] serde_json::Error),
}
