//! End-to-end check of the viewer feed: a real server on an ephemeral port,
//! an in-memory store, a WebSocket viewer and REST mutations.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use parking_radar_gateway::api::build_app;
use parking_radar_gateway::app_state::AppState;
use parking_radar_gateway::config::{AuthConfig, DEFAULT_ROLES_CLAIM, DEFAULT_WELCOME_MESSAGE};
use parking_radar_gateway::hub::BroadcastHub;
use parking_radar_gateway::persistence::MemoryStore;

const SECRET: &str = "integration-secret";

type Viewer = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start_server() -> (SocketAddr, BroadcastHub) {
    let auth = AuthConfig {
        jwt_secret: SECRET.to_string(),
        jwt_audience: None,
        roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
    };
    let hub = BroadcastHub::new(20, 64);
    let runner = hub.clone();
    tokio::spawn(async move { runner.run().await });

    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        hub.clone(),
        &auth,
        DEFAULT_WELCOME_MESSAGE,
    );
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move { axum::serve(listener, build_app(state)).await });
    (addr, hub)
}

fn token(subject: &str) -> String {
    let mut claims = json!({"sub": subject, "exp": Utc::now().timestamp() + 600});
    if let Some(map) = claims.as_object_mut() {
        map.insert(DEFAULT_ROLES_CLAIM.to_string(), json!(["admin_local"]));
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

async fn next_json(viewer: &mut Viewer) -> Value {
    loop {
        let Ok(Some(Ok(frame))) = tokio::time::timeout(Duration::from_secs(3), viewer.next()).await
        else {
            panic!("viewer received nothing");
        };
        if let Message::Text(text) = frame {
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("invalid json: {}", text.as_str());
            };
            return value;
        }
    }
}

async fn connect_viewer(addr: SocketAddr, hub: &BroadcastHub, expected: usize) -> Viewer {
    let (mut viewer, _) = tokio_test::assert_ok!(connect_async(format!("ws://{addr}/ws")).await);
    let welcome = next_json(&mut viewer).await;
    assert_eq!(welcome.get("type").and_then(Value::as_str), Some("welcome"));
    assert_eq!(
        welcome.pointer("/payload/message").and_then(Value::as_str),
        Some(DEFAULT_WELCOME_MESSAGE)
    );
    // Registration happens right after the welcome is written.
    for _ in 0..100 {
        if hub.client_count().await >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    viewer
}

#[tokio::test]
async fn viewers_receive_lot_and_sensor_changes() {
    let (addr, hub) = start_server().await;
    let mut first = connect_viewer(addr, &hub, 1).await;
    let mut second = connect_viewer(addr, &hub, 2).await;

    let client = reqwest::Client::new();
    let admin = token("auth0|owner");
    let base = format!("http://{addr}/api/v1");

    let created = tokio_test::assert_ok!(
        client
            .post(format!("{base}/parking-lots"))
            .bearer_auth(&admin)
            .json(&json!({"name": "Centro", "address": "Calle 1", "latitude": 4.6, "longitude": -74.0}))
            .send()
            .await
    );
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let body: Value = tokio_test::assert_ok!(created.json().await);
    let Some(lot_id) = body.get("id").and_then(Value::as_i64) else {
        panic!("missing id in {body}");
    };

    for viewer in [&mut first, &mut second] {
        let change = next_json(viewer).await;
        assert_eq!(
            change.get("type").and_then(Value::as_str),
            Some("new-change-in-parking")
        );
        assert_eq!(
            change.pointer("/payload/event").and_then(Value::as_str),
            Some("parking-lot-created")
        );
        assert_eq!(
            change.pointer("/payload/details/id").and_then(Value::as_i64),
            Some(lot_id)
        );
    }

    let registered = tokio_test::assert_ok!(
        client
            .post(format!("{base}/esp32-devices/register"))
            .bearer_auth(&admin)
            .json(&json!({"device_identifier": "AA:BB:CC"}))
            .send()
            .await
    );
    assert_eq!(registered.status(), reqwest::StatusCode::CREATED);

    let sensor = tokio_test::assert_ok!(
        client
            .post(format!("{base}/sensors"))
            .bearer_auth(&admin)
            .json(&json!({
                "parking_lot_id": lot_id,
                "device_identifier": "AA:BB:CC",
                "sensor_number": 1,
                "status": "occupied"
            }))
            .send()
            .await
    );
    assert_eq!(sensor.status(), reqwest::StatusCode::CREATED);

    let report = tokio_test::assert_ok!(
        client
            .put(format!("{base}/sensors/report"))
            .json(&json!({"device_identifier": "AA:BB:CC", "sensor_number": 1, "status": "free"}))
            .send()
            .await
    );
    assert_eq!(report.status(), reqwest::StatusCode::OK);

    // Each viewer sees sensor-created then sensor-updated, in order.
    for viewer in [&mut first, &mut second] {
        let created = next_json(viewer).await;
        assert_eq!(
            created.pointer("/payload/event").and_then(Value::as_str),
            Some("sensor-created")
        );
        let updated = next_json(viewer).await;
        assert_eq!(
            updated.pointer("/payload/event").and_then(Value::as_str),
            Some("sensor-updated")
        );
        assert_eq!(
            updated.pointer("/payload/details/status").and_then(Value::as_str),
            Some("free")
        );
    }

    let lots: Value = tokio_test::assert_ok!(
        tokio_test::assert_ok!(client.get(format!("{base}/parking-lots")).send().await)
            .json()
            .await
    );
    let Some(lot) = lots.as_array().and_then(|all| all.first()) else {
        panic!("expected one lot in {lots}");
    };
    assert_eq!(lot.get("available_spaces").and_then(Value::as_u64), Some(1));

    hub.stop();
}

#[tokio::test]
async fn closed_viewer_is_removed() {
    let (addr, hub) = start_server().await;
    let mut viewer = connect_viewer(addr, &hub, 1).await;
    assert_eq!(hub.client_count().await, 1);

    tokio_test::assert_ok!(viewer.close(None).await);
    for _ in 0..100 {
        if hub.client_count().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.client_count().await, 0);
    hub.stop();
}
