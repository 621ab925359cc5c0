//! Bearer-token authentication and role guards for Axum handlers.
//!
//! Tokens are HS256 JWTs issued by the identity provider. The subject comes
//! from `sub`; roles come from a configurable claim that may hold a single
//! string or an array of strings.

use std::collections::HashMap;
use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::config::AuthConfig;
use crate::domain::Caller;
use crate::domain::caller::{MANAGER_ROLES, REGISTRATION_ROLES};
use crate::error::ParkingError;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: String,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

/// Verifies bearer tokens and resolves them into a [`Caller`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    roles_claim: String,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .field("roles_claim", &self.roles_claim)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Builds a verifier from the token settings.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.jwt_audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            roles_claim: config.roles_claim.clone(),
        }
    }

    /// Validates `token` and returns the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::Unauthorized`] for a bad signature, an
    /// expired token or a wrong audience.
    pub fn verify(&self, token: &str) -> Result<Caller, ParkingError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            ParkingError::Unauthorized("invalid or expired token".to_string())
        })?;
        let roles = roles_from(data.claims.extra.get(&self.roles_claim));
        Ok(Caller::new(data.claims.sub, roles))
    }
}

fn roles_from(claim: Option<&serde_json::Value>) -> Vec<String> {
    match claim {
        Some(serde_json::Value::String(role)) => vec![role.clone()],
        Some(serde_json::Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ParkingError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ParkingError::Unauthorized("missing Authorization header".to_string()))?;
    header.strip_prefix("Bearer ").ok_or_else(|| {
        ParkingError::Unauthorized(
            "invalid Authorization format, expected: Bearer <token>".to_string(),
        )
    })
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ParkingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        state.verifier.verify(token)
    }
}

/// A caller holding `admin_local` or `admin_global`.
#[derive(Debug, Clone)]
pub struct Manager(pub Caller);

impl FromRequestParts<AppState> for Manager {
    type Rejection = ParkingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        caller.require_any_role(MANAGER_ROLES)?;
        Ok(Self(caller))
    }
}

/// A caller allowed to register as an admin (`admin_default` or
/// `admin_global`).
#[derive(Debug, Clone)]
pub struct Registrant(pub Caller);

impl FromRequestParts<AppState> for Registrant {
    type Rejection = ParkingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        caller.require_any_role(REGISTRATION_ROLES)?;
        Ok(Self(caller))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-secret";
    const ROLES: &str = "https://parkiu.com/roles";

    fn verifier(audience: Option<&str>) -> TokenVerifier {
        TokenVerifier::new(&AuthConfig {
            jwt_secret: SECRET.to_string(),
            jwt_audience: audience.map(str::to_string),
            roles_claim: ROLES.to_string(),
        })
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        let Ok(token) = encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        ) else {
            panic!("signing failed");
        };
        token
    }

    fn exp() -> i64 {
        Utc::now().timestamp() + 600
    }

    #[test]
    fn resolves_subject_and_role_array() {
        let token = sign(
            &json!({"sub": "auth0|a", "exp": exp(), "https://parkiu.com/roles": ["admin_local", "other"]}),
            SECRET,
        );
        let Ok(caller) = verifier(None).verify(&token) else {
            panic!("token should verify");
        };
        assert_eq!(caller.subject, "auth0|a");
        assert!(caller.has_role("admin_local"));
        assert!(caller.require_any_role(MANAGER_ROLES).is_ok());
    }

    #[test]
    fn accepts_single_role_string() {
        let token = sign(
            &json!({"sub": "auth0|a", "exp": exp(), "https://parkiu.com/roles": "admin_default"}),
            SECRET,
        );
        let Ok(caller) = verifier(None).verify(&token) else {
            panic!("token should verify");
        };
        assert_eq!(caller.roles, vec!["admin_default".to_string()]);
        assert!(caller.require_any_role(MANAGER_ROLES).is_err());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let forged = sign(&json!({"sub": "auth0|a", "exp": exp()}), "other");
        assert!(matches!(
            verifier(None).verify(&forged),
            Err(ParkingError::Unauthorized(_))
        ));

        let stale = sign(
            &json!({"sub": "auth0|a", "exp": Utc::now().timestamp() - 3600}),
            SECRET,
        );
        assert!(verifier(None).verify(&stale).is_err());
    }

    #[test]
    fn checks_audience_when_configured() {
        let token = sign(
            &json!({"sub": "auth0|a", "exp": exp(), "aud": "parking-api"}),
            SECRET,
        );
        assert!(verifier(Some("parking-api")).verify(&token).is_ok());
        assert!(verifier(Some("elsewhere")).verify(&token).is_err());
        assert!(verifier(None).verify(&token).is_ok());
    }
}
