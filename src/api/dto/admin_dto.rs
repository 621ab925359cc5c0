//! Admin account DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Admin, AdminProfile};

/// Request body for `POST /admins/complete-profile`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompleteProfileRequest {
    /// Tax identification number.
    pub nit: String,
    /// Profile photo URL.
    #[serde(default)]
    pub photo_url: String,
    /// Contact phone number.
    pub contact_phone: String,
}

impl From<CompleteProfileRequest> for AdminProfile {
    fn from(req: CompleteProfileRequest) -> Self {
        Self {
            nit: req.nit,
            photo_url: req.photo_url,
            contact_phone: req.contact_phone,
        }
    }
}

/// An admin profile as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminDto {
    /// Admin identifier.
    pub id: i64,
    /// Identity-provider subject.
    pub subject: String,
    /// Tax identification number.
    pub nit: String,
    /// Profile photo URL.
    pub photo_url: String,
    /// Contact phone number.
    pub contact_phone: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminDto {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id.get(),
            subject: admin.subject,
            nit: admin.nit,
            photo_url: admin.photo_url,
            contact_phone: admin.contact_phone,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}
