//! Session hub: the single task that owns all player mutation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::SnapshotStore;
use crate::util::time::PLAYER_FLUSH_INTERVAL;
use crate::ws::bus::BroadcastBus;
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::registry::SessionRegistry;
use super::SessionEvent;

/// Capacity of the hub's inbound event queue
const EVENT_QUEUE_DEPTH: usize = 256;

/// Composes the registry, bus and snapshot store behind a single event
/// queue. Connection events and the periodic flush interleave inside one
/// task, so registry mutation is never concurrent.
pub struct GameHub {
    registry: SessionRegistry,
    events_rx: mpsc::Receiver<SessionEvent>,
    bus: BroadcastBus,
    snapshots: SnapshotStore,
    player_count: Arc<AtomicUsize>,
}

impl GameHub {
    pub fn new(
        bus: BroadcastBus,
        snapshots: SnapshotStore,
        player_count: Arc<AtomicUsize>,
    ) -> (Self, mpsc::Sender<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        let hub = Self {
            registry: SessionRegistry::new(),
            events_rx,
            bus,
            snapshots,
            player_count,
        };

        (hub, events_tx)
    }

    /// Run the event loop for the lifetime of the process
    pub async fn run(mut self) {
        let mut flush = interval(PLAYER_FLUSH_INTERVAL);
        flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = flush.tick() => self.flush_players(),
            }
        }

        info!("Session hub stopped");
    }

    /// Apply one connection event. All registry mutation completes before
    /// any I/O is scheduled; store writes and the obstacle catch-up read
    /// run in their own tasks.
    fn handle_event(&mut self, event: SessionEvent) {
        let SessionEvent {
            conn_id,
            msg,
            received_at,
        } = event;

        match msg {
            ClientMsg::Join => self.handle_join(conn_id, received_at),
            ClientMsg::Flip => {
                if self.registry.contains(&conn_id) {
                    self.bus.broadcast(ServerMsg::PlayerFlip { id: conn_id });
                }
            }
            ClientMsg::Kick { data } => {
                if self.registry.contains(&conn_id) {
                    self.bus.broadcast(ServerMsg::PlayerKick { id: conn_id, data });
                }
            }
            ClientMsg::Die => {
                if self.registry.contains(&conn_id) {
                    self.bus.broadcast(ServerMsg::PlayerDie { id: conn_id });
                }
            }
            ClientMsg::Move { data } => {
                if let Some((score, total_score)) =
                    self.registry.apply_move(&conn_id, &data, received_at)
                {
                    self.bus.broadcast(ServerMsg::PlayerMove {
                        id: conn_id,
                        data,
                        score,
                        total_score,
                    });
                }
            }
            ClientMsg::Leave => self.handle_leave(conn_id),
        }
    }

    fn handle_join(&mut self, conn_id: Uuid, now_ms: u64) {
        let player = self.registry.register(conn_id, now_ms).clone();
        self.player_count
            .store(self.registry.len(), Ordering::Relaxed);

        info!(
            conn_id = %conn_id,
            player_count = self.registry.len(),
            "Player joined"
        );

        self.bus.broadcast(ServerMsg::NewPlayer { player });

        // Catch the joiner up on the batch everyone else already received
        let snapshots = self.snapshots.clone();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let obstacles = match snapshots.read_obstacles().await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to fetch current obstacles");
                    Vec::new()
                }
            };
            bus.unicast(conn_id, ServerMsg::CurrentObstacles { obstacles })
                .await;
        });
    }

    fn handle_leave(&mut self, conn_id: Uuid) {
        // A leave for a connection that never joined, or that already
        // left, is a no-op
        if self.registry.remove(&conn_id).is_none() {
            debug!(conn_id = %conn_id, "Leave for unregistered connection");
            return;
        }
        self.player_count
            .store(self.registry.len(), Ordering::Relaxed);

        info!(
            conn_id = %conn_id,
            player_count = self.registry.len(),
            "Player removed"
        );

        self.bus.broadcast(ServerMsg::PlayerRemove { id: conn_id });

        // A crash between flush ticks must not lose the disconnect
        self.flush_players();
    }

    /// Overwrite the stored player mapping with the current registry
    /// contents. The write happens off the hub task so a stalled store
    /// never blocks event processing.
    fn flush_players(&self) {
        let players = self.registry.players().clone();
        let snapshots = self.snapshots.clone();
        tokio::spawn(async move {
            if let Err(e) = snapshots.write_players(&players).await {
                warn!(error = %e, "Failed to store player snapshot");
            }
        });
    }
}
