//! Event fan-out over the live connections

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;
use uuid::Uuid;

use super::protocol::ServerMsg;

/// Capacity of the shared broadcast channel
const BROADCAST_DEPTH: usize = 64;
/// Capacity of each connection's direct delivery queue
const DIRECT_DEPTH: usize = 16;

/// Two delivery modes over the transport: broadcast reaches every
/// attached connection, the originator included; unicast reaches exactly
/// one and is used only for obstacle catch-up.
#[derive(Clone)]
pub struct BroadcastBus {
    events_tx: broadcast::Sender<ServerMsg>,
    direct: Arc<DashMap<Uuid, mpsc::Sender<ServerMsg>>>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(BROADCAST_DEPTH);
        Self {
            events_tx,
            direct: Arc::new(DashMap::new()),
        }
    }

    /// Attach a connection: subscribes it to broadcasts and registers its
    /// direct delivery queue. Returns both receiving ends.
    pub fn attach(
        &self,
        conn_id: Uuid,
    ) -> (broadcast::Receiver<ServerMsg>, mpsc::Receiver<ServerMsg>) {
        let (direct_tx, direct_rx) = mpsc::channel(DIRECT_DEPTH);
        self.direct.insert(conn_id, direct_tx);
        (self.events_tx.subscribe(), direct_rx)
    }

    pub fn detach(&self, conn_id: &Uuid) {
        self.direct.remove(conn_id);
    }

    /// Deliver to every attached connection. A send error only means
    /// nobody is connected right now.
    pub fn broadcast(&self, msg: ServerMsg) {
        let _ = self.events_tx.send(msg);
    }

    /// Deliver to one connection. Dropped silently if it already detached.
    pub async fn unicast(&self, conn_id: Uuid, msg: ServerMsg) {
        // Clone the sender out so the map shard is not held across the await
        let sender = self.direct.get(&conn_id).map(|entry| entry.value().clone());
        if let Some(sender) = sender {
            if sender.send(msg).await.is_err() {
                debug!(conn_id = %conn_id, "Unicast to closed connection");
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.direct.len()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_attached_connection() {
        let bus = BroadcastBus::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (mut rx_a, _direct_a) = bus.attach(a);
        let (mut rx_b, _direct_b) = bus.attach(b);

        bus.broadcast(ServerMsg::PlayerFlip { id: a });

        assert!(matches!(
            rx_a.recv().await.unwrap(),
            ServerMsg::PlayerFlip { id } if id == a
        ));
        assert!(matches!(
            rx_b.recv().await.unwrap(),
            ServerMsg::PlayerFlip { id } if id == a
        ));
    }

    #[tokio::test]
    async fn unicast_reaches_only_its_target() {
        let bus = BroadcastBus::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (_rx_a, mut direct_a) = bus.attach(a);
        let (_rx_b, mut direct_b) = bus.attach(b);

        bus.unicast(a, ServerMsg::CurrentObstacles { obstacles: vec![] })
            .await;

        assert!(matches!(
            direct_a.recv().await.unwrap(),
            ServerMsg::CurrentObstacles { .. }
        ));
        assert!(direct_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unicast_after_detach_is_dropped() {
        let bus = BroadcastBus::new();
        let a = Uuid::new_v4();
        let (_rx_a, mut direct_a) = bus.attach(a);

        bus.detach(&a);
        bus.unicast(a, ServerMsg::PlayerDie { id: a }).await;

        assert_eq!(bus.connection_count(), 0);
        assert!(direct_a.recv().await.is_none());
    }
}
