//! WebSocket transport modules

pub mod bus;
pub mod handler;
pub mod protocol;

pub use bus::BroadcastBus;
