//! Resolved identity of the principal behind a request.

use super::ParkingLot;
use crate::error::ParkingError;

/// Role granting access to every parking lot.
pub const ROLE_ADMIN_GLOBAL: &str = "admin_global";
/// Role of an admin who manages their own lots.
pub const ROLE_ADMIN_LOCAL: &str = "admin_local";
/// Role of an admin who has not registered yet.
pub const ROLE_ADMIN_DEFAULT: &str = "admin_default";

/// Roles allowed to manage lots, sensors and devices.
pub const MANAGER_ROLES: &[&str] = &[ROLE_ADMIN_LOCAL, ROLE_ADMIN_GLOBAL];
/// Roles allowed to register as an admin.
pub const REGISTRATION_ROLES: &[&str] = &[ROLE_ADMIN_DEFAULT, ROLE_ADMIN_GLOBAL];

/// Subject and roles of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Identity-provider subject.
    pub subject: String,
    /// Role names granted by the identity provider.
    pub roles: Vec<String>,
}

impl Caller {
    /// Creates a caller from a subject and its roles.
    #[must_use]
    pub fn new(subject: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    /// Returns `true` if the caller holds the global-admin role.
    #[must_use]
    pub fn is_global_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN_GLOBAL)
    }

    /// Returns `true` if the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Ensures the caller holds at least one of `allowed`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Forbidden`] otherwise.
    pub fn require_any_role(&self, allowed: &[&str]) -> Result<(), ParkingError> {
        if allowed.iter().any(|role| self.has_role(role)) {
            Ok(())
        } else {
            Err(ParkingError::Forbidden(
                "insufficient privileges".to_string(),
            ))
        }
    }

    /// Returns the subject, rejecting an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Unauthorized`] if the token carried no subject.
    pub fn subject(&self) -> Result<&str, ParkingError> {
        if self.subject.trim().is_empty() {
            return Err(ParkingError::Unauthorized(
                "token has no subject".to_string(),
            ));
        }
        Ok(&self.subject)
    }

    /// Ensures the caller may mutate `lot`: either they own it or they are a
    /// global admin.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Forbidden`] if neither holds.
    pub fn ensure_manages(&self, lot: &ParkingLot) -> Result<(), ParkingError> {
        if self.is_global_admin() || lot.is_owned_by(&self.subject) {
            Ok(())
        } else {
            Err(ParkingError::Forbidden(format!(
                "you don't have access to parking lot {}",
                lot.id
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::ParkingLotId;

    fn lot_owned_by(owner: &str) -> ParkingLot {
        let now = Utc::now();
        ParkingLot {
            id: ParkingLotId::new(5),
            name: "Sur".to_string(),
            address: "Cra 30".to_string(),
            latitude: 4.5,
            longitude: -74.1,
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn owner_manages_lot() {
        let caller = Caller::new("auth0|owner", vec![ROLE_ADMIN_LOCAL.to_string()]);
        assert!(caller.ensure_manages(&lot_owned_by("auth0|owner")).is_ok());
    }

    #[test]
    fn global_admin_manages_any_lot() {
        let caller = Caller::new("auth0|root", vec![ROLE_ADMIN_GLOBAL.to_string()]);
        assert!(caller.is_global_admin());
        assert!(caller.ensure_manages(&lot_owned_by("auth0|owner")).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let caller = Caller::new("auth0|other", vec![ROLE_ADMIN_LOCAL.to_string()]);
        let Err(err) = caller.ensure_manages(&lot_owned_by("auth0|owner")) else {
            panic!("expected forbidden");
        };
        assert!(matches!(err, ParkingError::Forbidden(_)));
    }

    #[test]
    fn role_gate() {
        let caller = Caller::new("auth0|new", vec![ROLE_ADMIN_DEFAULT.to_string()]);
        assert!(caller.require_any_role(REGISTRATION_ROLES).is_ok());
        assert!(caller.require_any_role(MANAGER_ROLES).is_err());
    }

    #[test]
    fn empty_subject_is_unauthorized() {
        let caller = Caller::new("", vec![]);
        assert!(matches!(
            caller.subject(),
            Err(ParkingError::Unauthorized(_))
        ));
    }
}
