//! Session synchronization core

pub mod hub;
pub mod obstacle;
pub mod player;
pub mod registry;
pub mod spawner;

pub use hub::GameHub;
pub use registry::SessionRegistry;
pub use spawner::ObstacleSpawner;

use uuid::Uuid;

use crate::ws::protocol::ClientMsg;

/// One connection event as read off the socket. `received_at` is stamped
/// by the transport reader and doubles as the state machine clock: events
/// are processed in arrival order, so it equals processing time within
/// channel latency, and tests can pin it exactly.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub conn_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}
