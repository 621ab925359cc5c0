//! REST API layer: authentication, route handlers, DTOs, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

/// Builds the full application: REST routes, the `/ws` viewer endpoint,
/// tracing and CORS layers, bound to `state`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AuthConfig, DEFAULT_ROLES_CLAIM, DEFAULT_WELCOME_MESSAGE};
    use crate::hub::BroadcastHub;
    use crate::persistence::MemoryStore;

    const SECRET: &str = "handler-secret";

    fn app() -> Router {
        let auth = AuthConfig {
            jwt_secret: SECRET.to_string(),
            jwt_audience: None,
            roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
        };
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            BroadcastHub::new(8, 8),
            &auth,
            DEFAULT_WELCOME_MESSAGE,
        );
        build_app(state)
    }

    fn token(subject: &str, role: &str) -> String {
        let mut claims = json!({"sub": subject, "exp": Utc::now().timestamp() + 600});
        if let Some(map) = claims.as_object_mut() {
            map.insert(DEFAULT_ROLES_CLAIM.to_string(), json!([role]));
        }
        let Ok(token) = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        ) else {
            panic!("signing failed");
        };
        token
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(req) = builder.body(body) else {
            panic!("invalid request");
        };
        req
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let Ok(response) = app.clone().oneshot(req).await;
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("unreadable body");
        };
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn lot_body(latitude: f64) -> Value {
        json!({"name": "Centro", "address": "Calle 1", "latitude": latitude, "longitude": -74.0})
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app();
        let (status, body) = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("status").and_then(Value::as_str), Some("healthy"));
    }

    #[tokio::test]
    async fn create_lot_requires_token_and_role() {
        let app = app();
        let (status, body) = send(
            &app,
            request("POST", "/api/v1/parking-lots", None, Some(lot_body(1.0))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.pointer("/error/code").and_then(Value::as_u64), Some(1101));

        let viewer = token("auth0|v", "admin_default");
        let (status, _) = send(
            &app,
            request("POST", "/api/v1/parking-lots", Some(&viewer), Some(lot_body(1.0))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn created_lot_is_listed_with_zero_availability() {
        let app = app();
        let admin = token("auth0|a", "admin_local");
        let (status, body) = send(
            &app,
            request("POST", "/api/v1/parking-lots", Some(&admin), Some(lot_body(1.0))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("id").and_then(Value::as_i64).is_some());

        let (status, body) = send(&app, request("GET", "/api/v1/parking-lots", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        let Some(first) = body.as_array().and_then(|lots| lots.first()) else {
            panic!("expected one lot in {body}");
        };
        assert_eq!(first.get("available_spaces").and_then(Value::as_u64), Some(0));
        assert_eq!(first.get("owner").and_then(Value::as_str), Some("auth0|a"));
    }

    #[tokio::test]
    async fn foreign_lot_update_is_forbidden() {
        let app = app();
        let owner = token("auth0|a", "admin_local");
        let (_, body) = send(
            &app,
            request("POST", "/api/v1/parking-lots", Some(&owner), Some(lot_body(1.0))),
        )
        .await;
        let Some(id) = body.get("id").and_then(Value::as_i64) else {
            panic!("missing id in {body}");
        };

        let intruder = token("auth0|b", "admin_local");
        let (status, body) = send(
            &app,
            request(
                "PUT",
                &format!("/api/v1/parking-lots/{id}"),
                Some(&intruder),
                Some(lot_body(2.0)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.pointer("/error/code").and_then(Value::as_u64), Some(1201));
    }

    #[tokio::test]
    async fn report_rejects_unknown_status() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                "PUT",
                "/api/v1/sensors/report",
                None,
                Some(json!({"device_identifier": "AA:BB", "sensor_number": 1, "status": "busy"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/error/code").and_then(Value::as_u64), Some(1002));
    }

    #[tokio::test]
    async fn missing_lot_is_not_found() {
        let app = app();
        let admin = token("auth0|a", "admin_global");
        let (status, _) = send(
            &app,
            request("GET", "/api/v1/parking-lots/404", Some(&admin), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
