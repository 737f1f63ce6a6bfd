//! Time utilities and session timing constants

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Obstacle spawn cadence
pub const SPAWN_INTERVAL: Duration = Duration::from_secs(5);
/// Delay between a spawn broadcast and the obstacle becoming active
pub const OBSTACLE_LEAD_IN_MS: u64 = 3_000;
/// Active lifetime of an obstacle after its lead-in
pub const OBSTACLE_LIFETIME_MS: u64 = 3_000;

/// Cadence of the periodic player snapshot flush to the external store
pub const PLAYER_FLUSH_INTERVAL: Duration = Duration::from_millis(800);
