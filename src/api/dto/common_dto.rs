//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Acknowledgement body for mutations, e.g.
/// `{"status": "parking lot created", "id": 7}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Human-readable outcome.
    pub status: String,
    /// Identifier of the created entity, when one was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl StatusResponse {
    /// An acknowledgement without an id.
    #[must_use]
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            id: None,
        }
    }

    /// An acknowledgement carrying the created entity's id.
    #[must_use]
    pub fn created(status: &str, id: impl Into<i64>) -> Self {
        Self {
            status: status.to_string(),
            id: Some(id.into()),
        }
    }
}
