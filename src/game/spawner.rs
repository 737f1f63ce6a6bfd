//! Recurring obstacle spawn loop

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::store::SnapshotStore;
use crate::util::time::{unix_millis, SPAWN_INTERVAL};
use crate::ws::bus::BroadcastBus;
use crate::ws::protocol::ServerMsg;

use super::obstacle::spawn_batch;

/// Perpetual scheduler producing obstacle batches for the lifetime of
/// the process, independent of any single connection.
pub struct ObstacleSpawner {
    bus: BroadcastBus,
    snapshots: SnapshotStore,
    rng: ChaCha8Rng,
}

impl ObstacleSpawner {
    pub fn new(bus: BroadcastBus, snapshots: SnapshotStore) -> Self {
        Self {
            bus,
            snapshots,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Run the spawn loop: each cycle generates a batch, replaces the
    /// stored snapshot, and fans the batch out to every connection.
    pub async fn run(mut self) {
        let mut ticker = interval(SPAWN_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let batch = spawn_batch(&mut self.rng, unix_millis());

            // A failed write leaves the store stale until the next cycle;
            // connected clients still receive the broadcast.
            if let Err(e) = self.snapshots.write_obstacles(&batch).await {
                warn!(error = %e, "Failed to store obstacle batch");
            }

            debug!(count = batch.len(), "Spawn cycle");
            self.bus.broadcast(ServerMsg::Spawn { obstacles: batch });
        }
    }
}
