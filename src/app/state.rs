//! Application state shared across routes

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::game::{GameHub, ObstacleSpawner, SessionEvent};
use crate::store::{KvClient, SnapshotStore};
use crate::ws::BroadcastBus;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub snapshots: SnapshotStore,
    pub bus: BroadcastBus,
    /// Inbound queue of the session hub
    pub events_tx: mpsc::Sender<SessionEvent>,
    /// Registered player count, maintained by the hub
    pub player_count: Arc<AtomicUsize>,
}

impl AppState {
    /// Build shared state plus the background tasks main must spawn
    pub fn new(config: Config) -> (Self, GameHub, ObstacleSpawner) {
        let config = Arc::new(config);

        // Initialize the external store client
        let kv = KvClient::new(&config);
        let snapshots = SnapshotStore::new(kv);

        // Initialize transport fan-out
        let bus = BroadcastBus::new();

        let player_count = Arc::new(AtomicUsize::new(0));

        // Initialize the session hub and the obstacle spawn loop
        let (hub, events_tx) = GameHub::new(bus.clone(), snapshots.clone(), player_count.clone());
        let spawner = ObstacleSpawner::new(bus.clone(), snapshots.clone());

        let state = Self {
            config,
            snapshots,
            bus,
            events_tx,
            player_count,
        };

        (state, hub, spawner)
    }
}
