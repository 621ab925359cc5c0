//! Viewer connection abstraction owned by the hub.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::HubError;

/// Identity of a registered viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    /// Creates a new random `ClientId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write side of one viewer's channel.
///
/// Once handed to [`super::BroadcastHub::add_client`] the connection is
/// owned by the hub's delivery lane for that viewer; nothing else writes to
/// it.
pub trait ViewerConnection: Send + 'static {
    /// Writes one serialized message to the viewer.
    fn deliver(&mut self, payload: Arc<str>) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Closes the channel. Errors are ignored: the viewer is gone either way.
    fn close(self) -> impl Future<Output = ()> + Send;
}
