//! Durable snapshots of live session state

use std::collections::HashMap;

use uuid::Uuid;

use crate::game::obstacle::Obstacle;
use crate::game::player::Player;

use super::kv::{KvClient, KvError};

/// Store key holding the latest obstacle batch
pub const OBSTACLES_KEY: &str = "current_obstacles";
/// Store key holding the full player mapping
pub const PLAYERS_KEY: &str = "current_players";

/// Snapshot reads and writes against the external store. Each write
/// replaces the stored value wholesale; there is no merging.
#[derive(Clone)]
pub struct SnapshotStore {
    kv: KvClient,
}

impl SnapshotStore {
    pub fn new(kv: KvClient) -> Self {
        Self { kv }
    }

    /// Wipe the player mapping at process start. Sessions are transport
    /// connections and cannot survive a restart, so the previous run's
    /// entries are discarded rather than resumed.
    pub async fn reset_players(&self) -> Result<(), KvError> {
        self.kv.set(PLAYERS_KEY, "{}".to_string()).await
    }

    /// Overwrite the full player mapping
    pub async fn write_players(&self, players: &HashMap<Uuid, Player>) -> Result<(), KvError> {
        let json = serde_json::to_string(players)?;
        self.kv.set(PLAYERS_KEY, json).await
    }

    /// The player mapping as of the last flush, empty if never written
    pub async fn read_players(&self) -> Result<HashMap<String, Player>, KvError> {
        match self.kv.get(PLAYERS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    /// Overwrite the current obstacle batch
    pub async fn write_obstacles(&self, batch: &[Obstacle]) -> Result<(), KvError> {
        let json = serde_json::to_string(batch)?;
        self.kv.set(OBSTACLES_KEY, json).await
    }

    /// The batch most recently written by the spawner, empty if none yet
    pub async fn read_obstacles(&self) -> Result<Vec<Obstacle>, KvError> {
        match self.kv.get(OBSTACLES_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerState;

    #[test]
    fn player_mapping_serializes_as_json_object() {
        let id = Uuid::new_v4();
        let mut players = HashMap::new();
        players.insert(id, Player::new(id, 1_700_000_000_000));

        let json = serde_json::to_string(&players).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let entry = &value[id.to_string()];
        assert_eq!(entry["state"], "IDLING");
        assert_eq!(entry["totalScore"], 0.0);
        assert_eq!(entry["created"], 1_700_000_000_000u64);
    }

    #[test]
    fn stored_mapping_round_trips_through_read_shape() {
        let id = Uuid::new_v4();
        let mut player = Player::new(id, 42);
        player.state = PlayerState::Running;
        player.updated = 42;

        let mut players = HashMap::new();
        players.insert(id, player);

        let json = serde_json::to_string(&players).unwrap();
        let read: HashMap<String, Player> = serde_json::from_str(&json).unwrap();
        assert_eq!(read[&id.to_string()].state, PlayerState::Running);
    }
}
