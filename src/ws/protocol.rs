//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::game::obstacle::Obstacle;
use crate::game::player::{MoveData, Player};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Enter the arena: registers a player record for this connection
    Join,

    /// Flip animation trigger, relayed verbatim
    Flip,

    /// Kick action; any client fields ride along to the broadcast
    Kick {
        #[serde(flatten)]
        data: Map<String, Value>,
    },

    /// Death animation trigger, relayed verbatim
    Die,

    /// Partial state/position update, run through the state machine
    Move {
        #[serde(flatten)]
        data: MoveData,
    },

    /// Leave the arena. Also synthesized by the transport on socket close
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// A player registered
    NewPlayer { player: Player },

    /// A player flipped
    PlayerFlip { id: Uuid },

    /// A player kicked, with whatever fields the sender attached
    PlayerKick {
        id: Uuid,
        #[serde(flatten)]
        data: Map<String, Value>,
    },

    /// A player died
    PlayerDie { id: Uuid },

    /// A player moved; echoes the incoming fields plus derived scores
    PlayerMove {
        id: Uuid,
        #[serde(flatten)]
        data: MoveData,
        score: f64,
        #[serde(rename = "totalScore")]
        total_score: f64,
    },

    /// A player disconnected
    PlayerRemove { id: Uuid },

    /// Fresh obstacle batch for the current spawn cycle
    Spawn { obstacles: Vec<Obstacle> },

    /// Catch-up copy of the current batch, unicast to a late joiner
    CurrentObstacles { obstacles: Vec<Obstacle> },
}
