//! WebSocket layer: the `/ws` viewer endpoint.
//!
//! Viewers receive a welcome message on connect and then every
//! `new-change-in-parking` envelope the [`crate::hub::BroadcastHub`] fans
//! out. Nothing a viewer sends is acted upon.

pub mod connection;
pub mod handler;
pub mod messages;
