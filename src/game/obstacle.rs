//! Obstacle descriptors and the randomized edge-spawn algorithm

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::time::{OBSTACLE_LEAD_IN_MS, OBSTACLE_LIFETIME_MS};

/// Side length of the square arena in world units
pub const ARENA_WIDTH: f64 = 500.0;
/// Obstacles are square with one fixed extent
pub const OBSTACLE_EXTENT: f64 = 24.0;
/// Inner play boundary obstacles spawn just outside of
pub const BOUND_MIN: f64 = ARENA_WIDTH * 3.0 / 20.0;
pub const BOUND_MAX: f64 = ARENA_WIDTH * 17.0 / 20.0;
/// Obstacles generated per spawn cycle
pub const BATCH_SIZE: usize = 3;

/// A transient hazard descriptor. The server only broadcasts spawn
/// parameters; motion and collision stay client-side, synchronized by
/// the shared `time_start`/`time_end` timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Visual/behavioral variant
    #[serde(rename = "type")]
    pub kind: u8,
    pub width: f64,
    pub height: f64,
    /// Perimeter index of the spawn edge: 0 top, 1 right, 2 bottom, 3 left
    pub edge: u8,
    /// Facing code tied to the edge
    pub orientation: i8,
    pub x: f64,
    pub y: f64,
    /// Unix millis bounding the client-visible active window
    pub time_start: u64,
    pub time_end: u64,
}

/// Generate one spawn batch stamped relative to `now_ms`
pub fn spawn_batch<R: Rng>(rng: &mut R, now_ms: u64) -> Vec<Obstacle> {
    (0..BATCH_SIZE).map(|_| spawn_one(rng, now_ms)).collect()
}

fn spawn_one<R: Rng>(rng: &mut R, now_ms: u64) -> Obstacle {
    let kind = rng.gen_range(0..=1u8);
    let half = OBSTACLE_EXTENT / 2.0;

    // Whole-unit position along the chosen edge, inside the boundary
    let t = rng.gen_range(BOUND_MIN as i64..=BOUND_MAX as i64) as f64;
    let edge = rng.gen_range(0..=3u8);

    let (x, y, orientation) = match edge {
        0 => (t, BOUND_MIN - half, 0),
        1 => (BOUND_MAX + half, t, 1),
        2 => (t, BOUND_MAX + half, 2),
        _ => (BOUND_MIN - half, t, -1),
    };

    Obstacle {
        kind,
        width: OBSTACLE_EXTENT,
        height: OBSTACLE_EXTENT,
        edge,
        orientation,
        x,
        y,
        time_start: now_ms + OBSTACLE_LEAD_IN_MS,
        time_end: now_ms + OBSTACLE_LEAD_IN_MS + OBSTACLE_LIFETIME_MS,
    }
}
