//! Admin account operations.

use std::sync::Arc;

use crate::domain::{Admin, AdminProfile, Caller};
use crate::error::ParkingError;
use crate::persistence::OccupancyStore;

/// Registers admins and maintains their profiles. Emits no events.
#[derive(Debug, Clone)]
pub struct AdminService {
    store: Arc<dyn OccupancyStore>,
}

impl AdminService {
    /// Creates a new `AdminService`.
    #[must_use]
    pub fn new(store: Arc<dyn OccupancyStore>) -> Self {
        Self { store }
    }

    /// Registers the caller as an admin with an empty profile.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Unauthorized`] if the caller has no subject
    /// or [`ParkingError::Conflict`] if it is already registered.
    pub async fn register(&self, caller: &Caller) -> Result<Admin, ParkingError> {
        let subject = caller.subject()?;
        let admin = self.store.create_admin(subject).await?;
        tracing::info!(admin_id = %admin.id, subject, "admin registered");
        Ok(admin)
    }

    /// Fills in the caller's profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::AdminNotFound`] if the caller never
    /// registered.
    pub async fn complete_profile(
        &self,
        caller: &Caller,
        profile: AdminProfile,
    ) -> Result<Admin, ParkingError> {
        let mut admin = self.profile(caller).await?;
        admin.apply_profile(profile);
        self.store.update_admin(&admin).await?;
        tracing::info!(admin_id = %admin.id, "admin profile completed");
        Ok(admin)
    }

    /// Returns the caller's admin record.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Unauthorized`] or
    /// [`ParkingError::AdminNotFound`].
    pub async fn profile(&self, caller: &Caller) -> Result<Admin, ParkingError> {
        let subject = caller.subject()?;
        self.store
            .find_admin_by_subject(subject)
            .await?
            .ok_or_else(|| ParkingError::AdminNotFound(subject.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::caller::ROLE_ADMIN_DEFAULT;
    use crate::persistence::MemoryStore;

    fn caller(subject: &str) -> Caller {
        Caller::new(subject, vec![ROLE_ADMIN_DEFAULT.to_string()])
    }

    #[tokio::test]
    async fn register_once_then_conflict() {
        let svc = AdminService::new(Arc::new(MemoryStore::new()));
        assert!(svc.register(&caller("auth0|a")).await.is_ok());
        assert!(matches!(
            svc.register(&caller("auth0|a")).await,
            Err(ParkingError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn profile_of_unregistered_admin_is_not_found() {
        let svc = AdminService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            svc.profile(&caller("auth0|ghost")).await,
            Err(ParkingError::AdminNotFound(_))
        ));
    }

    #[tokio::test]
    async fn complete_profile_persists_fields() {
        let svc = AdminService::new(Arc::new(MemoryStore::new()));
        let who = caller("auth0|a");
        assert!(svc.register(&who).await.is_ok());

        let profile = AdminProfile {
            nit: "900123".to_string(),
            photo_url: "https://img.example/a.png".to_string(),
            contact_phone: "+57 300".to_string(),
        };
        assert!(svc.complete_profile(&who, profile).await.is_ok());

        let Ok(stored) = svc.profile(&who).await else {
            panic!("profile should exist");
        };
        assert_eq!(stored.nit, "900123");
        assert_eq!(stored.contact_phone, "+57 300");
    }
}
