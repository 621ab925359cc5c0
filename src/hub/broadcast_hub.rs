//! Fan-out of change events to live viewer connections.
//!
//! [`BroadcastHub`] owns every registered [`ViewerConnection`]. Producers
//! enqueue [`ChangeEvent`]s through [`BroadcastHub::broadcast`] without ever
//! waiting; a single loop ([`BroadcastHub::run`]) drains the queue and hands
//! each serialized event to a per-viewer delivery lane. Lanes write
//! independently, so one stuck or broken viewer never delays the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, RwLock, mpsc, watch};

use super::connection::{ClientId, ViewerConnection};
use super::HubError;
use crate::domain::ChangeEvent;
use crate::ws::messages::ServerMessage;

/// Default capacity of the shared event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Default number of payloads buffered per viewer before it is evicted.
pub const DEFAULT_CLIENT_BUFFER: usize = 64;

/// Default limit on a single write to a viewer.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

type Clients = Arc<RwLock<HashMap<ClientId, ClientLane>>>;

/// Hub-side handle to one viewer's delivery lane.
#[derive(Debug)]
struct ClientLane {
    outbox: mpsc::Sender<Arc<str>>,
}

#[derive(Debug)]
struct HubInner {
    clients: Clients,
    queue_tx: mpsc::Sender<ChangeEvent>,
    queue_rx: Mutex<Option<mpsc::Receiver<ChangeEvent>>>,
    stop_tx: watch::Sender<bool>,
    client_buffer: usize,
    delivery_timeout: Duration,
    dropped: AtomicU64,
}

/// Broadcast hub for viewer connections.
///
/// Cheap to clone; every clone refers to the same hub. Construct one per
/// process and pass it to whatever needs to register viewers or publish
/// changes.
///
/// # Concurrency
///
/// - `add_client`, `remove_client` and `broadcast` may be called from any
///   task at any time.
/// - Events reach each viewer in the order `broadcast` accepted them.
/// - A viewer registered while an event is being fanned out may or may not
///   receive that event.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    /// Creates a hub with a bounded event queue of `queue_capacity` and a
    /// per-viewer buffer of `client_buffer` payloads.
    ///
    /// Zero capacities are raised to one. Writes to a viewer are bounded by
    /// [`DEFAULT_DELIVERY_TIMEOUT`].
    #[must_use]
    pub fn new(queue_capacity: usize, client_buffer: usize) -> Self {
        Self::with_delivery_timeout(queue_capacity, client_buffer, DEFAULT_DELIVERY_TIMEOUT)
    }

    /// Like [`BroadcastHub::new`], but a viewer whose write takes longer than
    /// `delivery_timeout` is evicted and closed.
    #[must_use]
    pub fn with_delivery_timeout(
        queue_capacity: usize,
        client_buffer: usize,
        delivery_timeout: Duration,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity.max(1));
        let (stop_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(HubInner {
                clients: Arc::new(RwLock::new(HashMap::new())),
                queue_tx,
                queue_rx: Mutex::new(Some(queue_rx)),
                stop_tx,
                client_buffer: client_buffer.max(1),
                delivery_timeout,
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Registers a viewer connection and returns its id.
    ///
    /// The connection becomes a broadcast target immediately. A dedicated
    /// task writes payloads to it until it fails, is removed, or the hub is
    /// dropped.
    pub async fn add_client<C: ViewerConnection>(&self, connection: C) -> ClientId {
        let client_id = ClientId::new();
        let (outbox, inbox) = mpsc::channel(self.inner.client_buffer);

        let count = {
            let mut clients = self.inner.clients.write().await;
            clients.insert(client_id, ClientLane { outbox });
            clients.len()
        };

        tokio::spawn(deliver_lane(
            client_id,
            connection,
            inbox,
            Arc::clone(&self.inner.clients),
            self.inner.delivery_timeout,
        ));

        tracing::info!(%client_id, total_clients = count, "viewer added");
        client_id
    }

    /// Deregisters a viewer. Removing an unknown id is a no-op.
    ///
    /// The viewer's lane finishes writing what it already holds and then
    /// closes the connection.
    pub async fn remove_client(&self, client_id: ClientId) {
        let (removed, count) = {
            let mut clients = self.inner.clients.write().await;
            let removed = clients.remove(&client_id).is_some();
            (removed, clients.len())
        };
        if removed {
            tracing::info!(%client_id, total_clients = count, "viewer removed");
        }
    }

    /// Enqueues `event` for delivery to every registered viewer.
    ///
    /// Never waits. Returns `false` when the event was dropped because the
    /// queue is full or the hub has stopped; the drop is logged and counted
    /// in [`BroadcastHub::dropped_events`].
    pub fn broadcast(&self, event: ChangeEvent) -> bool {
        let kind = event.kind();
        match self.inner.queue_tx.try_send(event) {
            Ok(()) => {
                tracing::debug!(event = kind, "change queued for broadcast");
                true
            }
            Err(TrySendError::Full(_)) => {
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(event = kind, "broadcast queue full, change dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(event = kind, "broadcast hub stopped, change dropped");
                false
            }
        }
    }

    /// Runs the event loop until [`BroadcastHub::stop`] is called.
    ///
    /// Must be started once per hub, typically in its own task.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::AlreadyRunning`] if the loop was already started.
    pub async fn run(&self) -> Result<(), HubError> {
        let Some(mut queue_rx) = self.inner.queue_rx.lock().await.take() else {
            return Err(HubError::AlreadyRunning);
        };
        let mut stop_rx = self.inner.stop_tx.subscribe();
        tracing::info!("broadcast hub started");

        loop {
            tokio::select! {
                biased;
                () = async {
                    let _ = stop_rx.wait_for(|stopped| *stopped).await;
                } => break,
                next = queue_rx.recv() => match next {
                    Some(event) => self.fan_out(&event).await,
                    None => break,
                },
            }
        }

        tracing::info!("broadcast hub stopped");
        Ok(())
    }

    /// Signals [`BroadcastHub::run`] to return. Safe to call repeatedly.
    ///
    /// Registered connections stay open; they end on their own read or
    /// write errors.
    pub fn stop(&self) {
        self.inner.stop_tx.send_replace(true);
    }

    /// Returns the number of registered viewers.
    pub async fn client_count(&self) -> usize {
        self.inner.clients.read().await.len()
    }

    /// Returns how many events `broadcast` has dropped so far.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Pushes one event into every viewer lane without waiting on any of them.
    async fn fan_out(&self, event: &ChangeEvent) {
        let payload: Arc<str> = match ServerMessage::change(event).to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::error!(event = event.kind(), error = %HubError::Encode(e), "dropping change");
                return;
            }
        };

        let mut lagging = Vec::new();
        {
            let clients = self.inner.clients.read().await;
            for (client_id, lane) in clients.iter() {
                match lane.outbox.try_send(Arc::clone(&payload)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => lagging.push(*client_id),
                    // Lane already exited; it removes itself.
                    Err(TrySendError::Closed(_)) => {}
                }
            }
            tracing::debug!(
                event = event.kind(),
                viewers = clients.len(),
                "change fanned out"
            );
        }

        for client_id in lagging {
            tracing::warn!(%client_id, "viewer buffer full, evicting");
            self.remove_client(client_id).await;
        }
    }
}

/// Writes queued payloads to one viewer in order.
///
/// A failed or stalled write evicts the viewer; in every case the connection
/// is closed when the lane ends.
async fn deliver_lane<C: ViewerConnection>(
    client_id: ClientId,
    mut connection: C,
    mut inbox: mpsc::Receiver<Arc<str>>,
    clients: Clients,
    delivery_timeout: Duration,
) {
    while let Some(payload) = inbox.recv().await {
        let write = tokio::time::timeout(delivery_timeout, connection.deliver(payload));
        let reason = match write.await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("write stalled for {delivery_timeout:?}"),
        };
        tracing::warn!(%client_id, error = %reason, "delivery failed, evicting viewer");
        let count = {
            let mut map = clients.write().await;
            map.remove(&client_id);
            map.len()
        };
        tracing::info!(%client_id, total_clients = count, "viewer removed");
        break;
    }
    if tokio::time::timeout(delivery_timeout, connection.close())
        .await
        .is_err()
    {
        tracing::warn!(%client_id, "viewer close timed out");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::ParkingLotId;

    /// Records every delivered payload; optionally fails every write.
    struct RecordingViewer {
        tx: mpsc::UnboundedSender<String>,
        fail: bool,
    }

    impl ViewerConnection for RecordingViewer {
        async fn deliver(&mut self, payload: Arc<str>) -> Result<(), HubError> {
            if self.fail {
                return Err(HubError::Delivery("broken pipe".to_string()));
            }
            self.tx
                .send(payload.to_string())
                .map_err(|e| HubError::Delivery(e.to_string()))
        }

        async fn close(self) {}
    }

    fn viewer() -> (RecordingViewer, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RecordingViewer { tx, fail: false }, rx)
    }

    /// Never completes a write; reports when it is closed.
    struct StalledViewer {
        closed: mpsc::UnboundedSender<()>,
    }

    impl ViewerConnection for StalledViewer {
        async fn deliver(&mut self, _payload: Arc<str>) -> Result<(), HubError> {
            std::future::pending().await
        }

        async fn close(self) {
            let _ = self.closed.send(());
        }
    }

    fn broken_viewer() -> RecordingViewer {
        let (tx, _rx) = mpsc::unbounded_channel();
        RecordingViewer { tx, fail: true }
    }

    fn deleted(id: i64) -> ChangeEvent {
        ChangeEvent::lot_deleted(ParkingLotId::new(id))
    }

    fn start(hub: &BroadcastHub) -> tokio::task::JoinHandle<Result<(), HubError>> {
        let hub = hub.clone();
        tokio::spawn(async move { hub.run().await })
    }

    async fn next_lot_id(rx: &mut mpsc::UnboundedReceiver<String>) -> i64 {
        let Ok(Some(json)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await else {
            panic!("no payload delivered");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
            panic!("invalid json: {json}");
        };
        assert_eq!(
            value.get("type").and_then(|v| v.as_str()),
            Some("new-change-in-parking")
        );
        let Some(id) = value
            .pointer("/payload/details/id")
            .and_then(serde_json::Value::as_i64)
        else {
            panic!("missing id in {json}");
        };
        id
    }

    async fn wait_for_count(hub: &BroadcastHub, expected: usize) {
        for _ in 0..100 {
            if hub.client_count().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("client count never reached {expected}");
    }

    #[tokio::test]
    async fn every_viewer_sees_every_event_in_order() {
        let hub = BroadcastHub::new(64, 64);
        let handle = start(&hub);

        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (conn, rx) = viewer();
            hub.add_client(conn).await;
            receivers.push(rx);
        }

        for id in 1..=5 {
            assert!(hub.broadcast(deleted(id)));
        }

        for rx in &mut receivers {
            for expected in 1..=5 {
                assert_eq!(next_lot_id(rx).await, expected);
            }
        }

        hub.stop();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn broadcast_drops_when_queue_full() {
        let hub = BroadcastHub::new(1, 8);

        assert!(hub.broadcast(deleted(1)));
        assert!(!hub.broadcast(deleted(2)));
        assert!(!hub.broadcast(deleted(3)));
        assert_eq!(hub.dropped_events(), 2);
    }

    #[tokio::test]
    async fn removed_viewer_does_not_affect_others() {
        let hub = BroadcastHub::new(16, 16);
        let handle = start(&hub);

        let (a, mut rx_a) = viewer();
        let (b, mut rx_b) = viewer();
        let a_id = hub.add_client(a).await;
        hub.add_client(b).await;

        hub.broadcast(deleted(1));
        assert_eq!(next_lot_id(&mut rx_a).await, 1);

        hub.remove_client(a_id).await;
        hub.remove_client(a_id).await;
        hub.broadcast(deleted(2));

        assert_eq!(next_lot_id(&mut rx_b).await, 1);
        assert_eq!(next_lot_id(&mut rx_b).await, 2);
        assert_eq!(hub.client_count().await, 1);

        hub.stop();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn failing_viewer_is_evicted() {
        let hub = BroadcastHub::new(16, 16);
        let handle = start(&hub);

        hub.add_client(broken_viewer()).await;
        let (good, mut rx) = viewer();
        hub.add_client(good).await;
        assert_eq!(hub.client_count().await, 2);

        hub.broadcast(deleted(7));
        assert_eq!(next_lot_id(&mut rx).await, 7);
        wait_for_count(&hub, 1).await;

        hub.broadcast(deleted(8));
        assert_eq!(next_lot_id(&mut rx).await, 8);

        hub.stop();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn stop_ends_run_and_is_idempotent() {
        let hub = BroadcastHub::new(4, 4);
        let handle = start(&hub);

        hub.stop();
        hub.stop();

        let Ok(joined) = tokio::time::timeout(Duration::from_secs(2), handle).await else {
            panic!("hub loop did not stop");
        };
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn second_run_is_rejected() {
        let hub = BroadcastHub::new(4, 4);
        hub.stop();
        assert!(hub.run().await.is_ok());
        assert!(matches!(hub.run().await, Err(HubError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn viewer_added_after_event_misses_it() {
        let hub = BroadcastHub::new(16, 16);
        let handle = start(&hub);

        let (early, mut rx_early) = viewer();
        hub.add_client(early).await;
        hub.broadcast(deleted(1));
        assert_eq!(next_lot_id(&mut rx_early).await, 1);

        let (late, mut rx_late) = viewer();
        hub.add_client(late).await;
        hub.broadcast(deleted(2));
        assert_eq!(next_lot_id(&mut rx_late).await, 2);

        hub.stop();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn stalled_viewer_is_evicted_and_closed() {
        let hub = BroadcastHub::with_delivery_timeout(16, 16, Duration::from_millis(50));
        let handle = start(&hub);

        let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
        hub.add_client(StalledViewer { closed: closed_tx }).await;
        let (good, mut rx) = viewer();
        hub.add_client(good).await;

        hub.broadcast(deleted(3));
        assert_eq!(next_lot_id(&mut rx).await, 3);
        wait_for_count(&hub, 1).await;

        let Ok(Some(())) = tokio::time::timeout(Duration::from_secs(2), closed_rx.recv()).await
        else {
            panic!("stalled viewer was never closed");
        };

        hub.stop();
        let _ = handle.await;
    }
}
