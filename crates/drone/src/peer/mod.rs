//! Peer module — the RPC client helper used by every propagating handler.

pub mod client;
pub mod error;

pub use client::PeerClient;
pub use error::PeerError;
