//! Player records and the per-player state transition rules

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle state reported by the client. Advisory: the server accepts
/// any requested transition and only derives score bookkeeping from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    Idling,
    Running,
    Ducking,
    Jumping,
    Dead,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::Idling
    }
}

/// Partial update carried by a `move` event. Absent fields leave the
/// record untouched; unknown fields merge through verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PlayerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One connected participant. The session registry is the sole mutable
/// owner of these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub state: PlayerState,
    /// Unix millis at registration
    pub created: u64,
    /// Unix millis at the start of the current running streak, 0 before the first
    pub updated: u64,
    /// Seconds elapsed in the current running streak (derived)
    pub score: f64,
    /// Seconds accumulated across running streaks that ended in death
    pub total_score: f64,
    /// Client-reported fields outside the fixed schema, kept through merges
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Player {
    pub fn new(id: Uuid, now_ms: u64) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            state: PlayerState::Idling,
            created: now_ms,
            updated: 0,
            score: 0.0,
            total_score: 0.0,
            extra: Map::new(),
        }
    }

    /// Apply a `move` update. Score bookkeeping reads the record's state
    /// and streak clock as they were before the incoming fields land:
    /// entering RUNNING arms the clock, RUNNING into DEAD banks the
    /// streak, and staying in RUNNING refreshes the derived score. Only
    /// then do the client-reported fields merge over the record.
    pub fn apply_move(&mut self, data: &MoveData, now_ms: u64) {
        let streak_secs = now_ms.saturating_sub(self.updated) as f64 / 1000.0;

        if self.state != PlayerState::Running && data.state == Some(PlayerState::Running) {
            self.updated = now_ms;
        }
        if self.state == PlayerState::Running && data.state == Some(PlayerState::Dead) {
            self.total_score += streak_secs;
        }
        if self.state == PlayerState::Running {
            self.score = streak_secs;
        }

        if let Some(state) = data.state {
            self.state = state;
        }
        if let Some(x) = data.x {
            self.x = x;
        }
        if let Some(y) = data.y {
            self.y = y;
        }
        for (key, value) in &data.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_to(state: PlayerState) -> MoveData {
        MoveData {
            state: Some(state),
            ..Default::default()
        }
    }

    #[test]
    fn scores_stay_zero_without_running() {
        let mut player = Player::new(Uuid::new_v4(), 500);

        player.apply_move(&move_to(PlayerState::Jumping), 2_000);
        player.apply_move(&move_to(PlayerState::Ducking), 5_000);
        player.apply_move(&move_to(PlayerState::Dead), 9_000);
        player.apply_move(&move_to(PlayerState::Idling), 12_000);

        assert_eq!(player.score, 0.0);
        assert_eq!(player.total_score, 0.0);
        assert_eq!(player.updated, 0);
    }

    #[test]
    fn entering_running_arms_the_streak_clock() {
        let mut player = Player::new(Uuid::new_v4(), 0);

        player.apply_move(&move_to(PlayerState::Running), 1_000);

        assert_eq!(player.updated, 1_000);
        assert_eq!(player.state, PlayerState::Running);
        // Score only refreshes while already running
        assert_eq!(player.score, 0.0);
    }

    #[test]
    fn score_tracks_the_elapsed_streak() {
        let mut player = Player::new(Uuid::new_v4(), 0);

        player.apply_move(&move_to(PlayerState::Running), 1_000);
        player.apply_move(&move_to(PlayerState::Running), 3_500);

        assert_eq!(player.score, 2.5);
        // The clock is not re-armed while the streak continues
        assert_eq!(player.updated, 1_000);
    }

    #[test]
    fn death_banks_the_streak_into_total() {
        let mut player = Player::new(Uuid::new_v4(), 0);

        player.apply_move(&move_to(PlayerState::Running), 1_000);
        player.apply_move(&move_to(PlayerState::Running), 3_500);
        player.apply_move(&move_to(PlayerState::Dead), 4_000);

        assert_eq!(player.total_score, 3.0);
        assert_eq!(player.state, PlayerState::Dead);

        // Later non-running states leave the total untouched
        player.apply_move(&move_to(PlayerState::Idling), 9_000);
        player.apply_move(&move_to(PlayerState::Ducking), 11_000);
        assert_eq!(player.total_score, 3.0);
    }

    #[test]
    fn restart_after_death_accrues_a_second_streak() {
        let mut player = Player::new(Uuid::new_v4(), 0);

        player.apply_move(&move_to(PlayerState::Running), 1_000);
        player.apply_move(&move_to(PlayerState::Dead), 4_000);
        assert_eq!(player.total_score, 3.0);

        player.apply_move(&move_to(PlayerState::Running), 10_000);
        assert_eq!(player.updated, 10_000);

        player.apply_move(&move_to(PlayerState::Running), 12_000);
        assert_eq!(player.score, 2.0);

        player.apply_move(&move_to(PlayerState::Dead), 13_000);
        assert_eq!(player.total_score, 6.0);
    }

    #[test]
    fn leaving_running_without_dying_banks_nothing() {
        let mut player = Player::new(Uuid::new_v4(), 0);

        player.apply_move(&move_to(PlayerState::Running), 1_000);
        player.apply_move(&move_to(PlayerState::Jumping), 3_000);

        assert_eq!(player.total_score, 0.0);
        // The final refresh of the old streak still happened
        assert_eq!(player.score, 2.0);
    }

    #[test]
    fn merge_applies_client_fields_last() {
        let mut player = Player::new(Uuid::new_v4(), 0);

        let mut extra = Map::new();
        extra.insert("facing".to_string(), Value::String("left".to_string()));
        let data = MoveData {
            state: None,
            x: Some(120.5),
            y: Some(88.0),
            extra,
        };
        player.apply_move(&data, 2_000);

        assert_eq!(player.x, 120.5);
        assert_eq!(player.y, 88.0);
        assert_eq!(player.state, PlayerState::Idling);
        assert_eq!(player.extra["facing"], "left");
    }

    #[test]
    fn wire_format_uses_camel_case_and_upper_states() {
        let player = Player::new(Uuid::new_v4(), 7);
        let value = serde_json::to_value(&player).unwrap();

        assert_eq!(value["state"], "IDLING");
        assert_eq!(value["totalScore"], 0.0);
        assert_eq!(value["created"], 7);
        assert!(value.get("total_score").is_none());
    }
}
