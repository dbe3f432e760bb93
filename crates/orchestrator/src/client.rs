//! Client — typed gRPC wrapper around one drone node.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::error::{OrchestratorError, Result};

// Include the generated protobuf code
pub mod proto {
    tonic::include_proto!("ringform.drone");
}

pub use proto::{
    formation_service_client::FormationServiceClient,
    telemetry_service_client::TelemetryServiceClient,
    // Request/Response types
    SetNeighbourRequest, SetNeighbourResponse,
    CommitMoveRequest, CommitMoveResponse,
    LeaveRingRequest, LeaveRingResponse,
    StatusRequest, StatusUpdate,
    // Enums
    Side,
};

/// One connected drone. Commands go through the formation client,
/// status queries through the telemetry client.
#[derive(Debug)]
pub struct DroneClient {
    pub id: u32,
    channel: Channel,
}

impl DroneClient {
    pub async fn connect(id: u32, address: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Endpoint::from_shared(address.to_string())
            .map_err(|source| OrchestratorError::Connect {
                id,
                address: address.to_string(),
                source,
            })?
            .timeout(timeout);
        let channel = endpoint
            .connect()
            .await
            .map_err(|source| OrchestratorError::Connect {
                id,
                address: address.to_string(),
                source,
            })?;
        Ok(Self { id, channel })
    }

    /// Rewire one ring link; with `anchor` set the drone seeds the
    /// angle wave before responding.
    pub async fn set_neighbour(
        &self,
        anchor: bool,
        neighbour_id: u32,
        side: Side,
    ) -> Result<()> {
        let mut client = FormationServiceClient::new(self.channel.clone());
        let response = client
            .set_neighbour(SetNeighbourRequest {
                anchor,
                neighbour_id,
                side: side as i32,
                ring_size: 0,
            })
            .await
            .map_err(|status| OrchestratorError::Rpc {
                id: self.id,
                status,
            })?
            .into_inner();
        if !response.success {
            return Err(OrchestratorError::Rejected {
                id: self.id,
                reason: response.reason,
            });
        }
        Ok(())
    }

    pub async fn commit_move(&self) -> Result<CommitMoveResponse> {
        let mut client = FormationServiceClient::new(self.channel.clone());
        let response = client
            .commit_move(CommitMoveRequest {})
            .await
            .map_err(|status| OrchestratorError::Rpc {
                id: self.id,
                status,
            })?
            .into_inner();
        if !response.success {
            return Err(OrchestratorError::Rejected {
                id: self.id,
                reason: response.reason,
            });
        }
        Ok(response)
    }

    pub async fn leave_ring(&self) -> Result<()> {
        let mut client = FormationServiceClient::new(self.channel.clone());
        let response = client
            .leave_ring(LeaveRingRequest {})
            .await
            .map_err(|status| OrchestratorError::Rpc {
                id: self.id,
                status,
            })?
            .into_inner();
        if !response.success {
            return Err(OrchestratorError::Rejected {
                id: self.id,
                reason: response.reason,
            });
        }
        Ok(())
    }

    pub async fn get_status(&self) -> Result<StatusUpdate> {
        let mut client = TelemetryServiceClient::new(self.channel.clone());
        let response = client
            .get_status(StatusRequest {})
            .await
            .map_err(|status| OrchestratorError::Rpc {
                id: self.id,
                status,
            })?;
        Ok(response.into_inner())
    }
}
