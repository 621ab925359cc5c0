//! Admin accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AdminId;

/// An administrator known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admin {
    /// Admin identifier.
    pub id: AdminId,
    /// Identity-provider subject (unique).
    pub subject: String,
    /// Tax identification number.
    pub nit: String,
    /// Profile photo URL.
    pub photo_url: String,
    /// Contact phone number.
    pub contact_phone: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Profile fields an admin fills in after registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminProfile {
    /// Tax identification number.
    pub nit: String,
    /// Profile photo URL.
    pub photo_url: String,
    /// Contact phone number.
    pub contact_phone: String,
}

impl Admin {
    /// Overwrites the profile fields.
    pub fn apply_profile(&mut self, profile: AdminProfile) {
        self.nit = profile.nit;
        self.photo_url = profile.photo_url;
        self.contact_phone = profile.contact_phone;
        self.updated_at = Utc::now();
    }
}
