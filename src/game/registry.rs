//! In-memory mapping of live connections to player records

use std::collections::HashMap;

use uuid::Uuid;

use super::player::{MoveData, Player};

/// Single source of truth for "current players". All mutation funnels
/// through this narrow API; the hub task is the only owner, so the map
/// needs no locking.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: HashMap<Uuid, Player>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
        }
    }

    /// Insert a fresh record for `conn_id`. A resent join overwrites the
    /// existing record rather than failing; clients may retry.
    pub fn register(&mut self, conn_id: Uuid, now_ms: u64) -> &Player {
        self.players.insert(conn_id, Player::new(conn_id, now_ms));
        &self.players[&conn_id]
    }

    pub fn get(&self, conn_id: &Uuid) -> Option<&Player> {
        self.players.get(conn_id)
    }

    pub fn contains(&self, conn_id: &Uuid) -> bool {
        self.players.contains_key(conn_id)
    }

    /// Remove the record. None when the connection never registered or
    /// was already removed.
    pub fn remove(&mut self, conn_id: &Uuid) -> Option<Player> {
        self.players.remove(conn_id)
    }

    /// Run the state transition rules for an incoming partial update and
    /// merge it into the record. Returns the derived (score, total_score)
    /// pair, or None for an unregistered connection.
    pub fn apply_move(
        &mut self,
        conn_id: &Uuid,
        data: &MoveData,
        now_ms: u64,
    ) -> Option<(f64, f64)> {
        let player = self.players.get_mut(conn_id)?;
        player.apply_move(data, now_ms);
        Some((player.score, player.total_score))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Snapshot view for serialization to the external store
    pub fn players(&self) -> &HashMap<Uuid, Player> {
        &self.players
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerState;

    #[test]
    fn register_creates_default_record() {
        let mut registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        let player = registry.register(id, 5_000);
        assert_eq!(player.state, PlayerState::Idling);
        assert_eq!(player.created, 5_000);
        assert_eq!(player.score, 0.0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_join_overwrites_the_record() {
        let mut registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        registry.register(id, 1_000);
        let data = MoveData {
            state: Some(PlayerState::Running),
            ..Default::default()
        };
        registry.apply_move(&id, &data, 2_000);

        let player = registry.register(id, 3_000);
        assert_eq!(player.state, PlayerState::Idling);
        assert_eq!(player.created, 3_000);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_twice_is_a_noop() {
        let mut registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        registry.register(id, 0);
        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn apply_move_on_unknown_connection_is_none() {
        let mut registry = SessionRegistry::new();
        let data = MoveData::default();
        assert!(registry.apply_move(&Uuid::new_v4(), &data, 100).is_none());
    }

    #[test]
    fn apply_move_returns_derived_scores() {
        let mut registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, 0);

        let run = MoveData {
            state: Some(PlayerState::Running),
            ..Default::default()
        };
        registry.apply_move(&id, &run, 1_000);
        let (score, total) = registry.apply_move(&id, &run, 3_500).unwrap();
        assert_eq!(score, 2.5);
        assert_eq!(total, 0.0);

        let die = MoveData {
            state: Some(PlayerState::Dead),
            ..Default::default()
        };
        let (_, total) = registry.apply_move(&id, &die, 4_000).unwrap();
        assert_eq!(total, 3.0);
    }
}
