//! External store modules for durable session snapshots

pub mod kv;
pub mod snapshots;

pub use kv::KvClient;
pub use snapshots::SnapshotStore;
