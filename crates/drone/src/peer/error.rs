//! Error — failures of the peer RPC client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("no topology entry for drone {0}")]
    UnknownPeer(u32),

    #[error("invalid endpoint for drone {id}: {detail}")]
    InvalidEndpoint { id: u32, detail: String },

    #[error("shutting down while waiting for drone {0}")]
    ShuttingDown(u32),

    #[error("rpc to drone {id} failed: {status}")]
    Rpc { id: u32, status: tonic::Status },
}
