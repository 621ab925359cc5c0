//! # parking-radar-gateway
//!
//! REST API and WebSocket gateway for real-time parking-lot occupancy.
//!
//! Admins register parking lots, ESP32 devices and their sensors; devices
//! report whether each space is free or occupied. Every lot and sensor
//! mutation is pushed to connected viewers over `/ws`, and lot listings
//! carry a live count of available spaces.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)          ESP32 devices
//!     │                                   │
//!     ├── REST Handlers (api/) ◄──────────┘
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Services (service/) ──► BroadcastHub (hub/) ──► viewers
//!     ├── AvailabilityAggregator (service/)
//!     │
//!     └── OccupancyStore (persistence/): PostgreSQL or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod persistence;
pub mod service;
pub mod ws;
