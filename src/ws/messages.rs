//! WebSocket message types pushed from the server to viewers.

use serde::Serialize;

use crate::domain::ChangeEvent;

/// Top-level message envelope sent to viewers.
///
/// Serializes as `{"type": "<kind>", "payload": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage<'a> {
    /// One-time greeting sent right after the upgrade.
    Welcome {
        /// Greeting text.
        message: &'a str,
    },
    /// A lot or sensor changed.
    NewChangeInParking(&'a ChangeEvent),
}

impl<'a> ServerMessage<'a> {
    /// Builds the welcome envelope.
    #[must_use]
    pub const fn welcome(message: &'a str) -> Self {
        Self::Welcome { message }
    }

    /// Builds the change-broadcast envelope.
    #[must_use]
    pub const fn change(event: &'a ChangeEvent) -> Self {
        Self::NewChangeInParking(event)
    }

    /// Serializes the envelope to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ParkingLotId;
    use crate::domain::change_event::LotChange;

    #[test]
    fn welcome_shape() {
        let Ok(json) = ServerMessage::welcome("hola").to_json() else {
            panic!("serialization failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
            panic!("invalid json");
        };
        assert_eq!(value.get("type").and_then(|v| v.as_str()), Some("welcome"));
        assert_eq!(
            value.pointer("/payload/message").and_then(|v| v.as_str()),
            Some("hola")
        );
    }

    #[test]
    fn change_shape() {
        let event = ChangeEvent::ParkingLotCreated(LotChange {
            id: ParkingLotId::new(1),
            name: "Centro".to_string(),
            address: "Calle 1".to_string(),
        });
        let Ok(json) = ServerMessage::change(&event).to_json() else {
            panic!("serialization failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
            panic!("invalid json");
        };
        assert_eq!(
            value.get("type").and_then(|v| v.as_str()),
            Some("new-change-in-parking")
        );
        assert_eq!(
            value.pointer("/payload/event").and_then(|v| v.as_str()),
            Some("parking-lot-created")
        );
        assert_eq!(
            value.pointer("/payload/details/name").and_then(|v| v.as_str()),
            Some("Centro")
        );
    }
}
