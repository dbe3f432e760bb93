//! Map — translate state and peer failures into gRPC status codes.

use tonic::Status;

use crate::peer::PeerError;
use crate::state::StateError;

pub fn map_state_error(err: StateError) -> Status {
    match err {
        StateError::AngleDomain(_) | StateError::IncrementDomain(_) | StateError::RingSize(_) => {
            Status::invalid_argument(err.to_string())
        }
        StateError::Landed(_) | StateError::MissingNeighbour(_) => {
            Status::failed_precondition(err.to_string())
        }
        StateError::Closed => Status::unavailable(err.to_string()),
    }
}

pub fn map_peer_error(err: PeerError) -> Status {
    match err {
        PeerError::UnknownPeer(_) | PeerError::InvalidEndpoint { .. } => {
            Status::failed_precondition(err.to_string())
        }
        PeerError::ShuttingDown(_) => Status::cancelled(err.to_string()),
        PeerError::Rpc { ref status, .. } => Status::new(status.code(), err.to_string()),
    }
}
