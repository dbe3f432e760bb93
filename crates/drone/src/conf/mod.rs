//! Conf module — configuration model, loading, and topology table.

pub mod model;
pub mod load;

pub use model::{DroneConfig, PeerEntry};
