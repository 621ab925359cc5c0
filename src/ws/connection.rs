//! Per-socket viewer session.
//!
//! The write half of the socket is handed to the [`BroadcastHub`] as a
//! [`WsViewer`]; the read half stays here and only watches for the viewer
//! going away.

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use super::messages::ServerMessage;
use crate::hub::{BroadcastHub, HubError, ViewerConnection};

/// Write half of a viewer's WebSocket.
pub struct WsViewer {
    sink: SplitSink<WebSocket, Message>,
}

impl fmt::Debug for WsViewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsViewer").finish_non_exhaustive()
    }
}

impl WsViewer {
    /// Wraps the write half of a socket.
    #[must_use]
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

impl ViewerConnection for WsViewer {
    async fn deliver(&mut self, payload: Arc<str>) -> Result<(), HubError> {
        self.sink
            .send(Message::text(payload.to_string()))
            .await
            .map_err(|e| HubError::Delivery(e.to_string()))
    }

    async fn close(mut self) {
        // The peer may already be gone.
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
    }
}

/// Runs one viewer session: greet, register with the hub, then read until
/// the viewer disconnects.
///
/// Inbound text and binary frames are logged and discarded; viewers have
/// nothing to send.
pub async fn run_connection(socket: WebSocket, hub: BroadcastHub, welcome_message: Arc<str>) {
    let (mut sink, mut stream) = socket.split();

    let greeting = match ServerMessage::welcome(&welcome_message).to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode welcome message");
            return;
        }
    };
    if let Err(e) = sink.send(Message::text(greeting)).await {
        tracing::debug!(error = %e, "viewer left before welcome");
        return;
    }

    let client_id = hub.add_client(WsViewer::new(sink)).await;

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                tracing::debug!(%client_id, message = %text.as_str(), "ignoring viewer message");
            }
            Ok(Message::Binary(bytes)) => {
                tracing::debug!(%client_id, len = bytes.len(), "ignoring binary viewer message");
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                tracing::debug!(%client_id, error = %e, "viewer read failed");
                break;
            }
        }
    }

    hub.remove_client(client_id).await;
}
