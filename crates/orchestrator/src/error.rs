//! Error — orchestrator-side failures when driving the ring.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no endpoint configured for drone {0}")]
    UnknownDrone(u32),

    #[error("failed to connect to drone {id} at {address}: {source}")]
    Connect {
        id: u32,
        address: String,
        source: tonic::transport::Error,
    },

    #[error("rpc to drone {id} failed: {status}")]
    Rpc { id: u32, status: tonic::Status },

    #[error("drone {id} rejected the request: {reason}")]
    Rejected { id: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
