//! Client — resolve a peer, wait until it is reachable, send one request.
//!
//! Centralizes all probing, timeout and cancellation behaviour for the
//! outbound half of the ring protocol: wave forwarding, leave rewiring
//! and the neighbour-status subscriptions all go through here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

use crate::conf::DroneConfig;
use crate::proto::{
    AngleWaveRequest, AngleWaveResponse, FormationServiceClient, SetNeighbourRequest,
    SetNeighbourResponse, StatusStreamRequest, StatusUpdate, TelemetryServiceClient,
};

use super::error::PeerError;

/// Cheap to clone: the topology table is shared and channels are
/// established per call, mirroring the one-shot client the handlers
/// conceptually need.
#[derive(Clone)]
pub struct PeerClient {
    topology: Arc<HashMap<u32, String>>,
    probe_interval: Duration,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl PeerClient {
    pub fn new(config: &DroneConfig, shutdown: CancellationToken) -> Self {
        Self {
            topology: Arc::new(config.topology()),
            probe_interval: Duration::from_millis(config.probe_interval_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            shutdown,
        }
    }

    fn resolve(&self, id: u32) -> Result<&str, PeerError> {
        self.topology
            .get(&id)
            .map(String::as_str)
            .ok_or(PeerError::UnknownPeer(id))
    }

    /// Probe the peer at a bounded interval until it accepts a
    /// connection. Retries indefinitely; only shutdown breaks the wait.
    async fn connect(&self, id: u32) -> Result<Channel, PeerError> {
        let address = self.resolve(id)?;
        let endpoint = Endpoint::from_shared(address.to_string())
            .map_err(|e| PeerError::InvalidEndpoint {
                id,
                detail: e.to_string(),
            })?
            .connect_timeout(self.probe_interval)
            .timeout(self.request_timeout);

        let mut attempt: u64 = 0;
        loop {
            if self.shutdown.is_cancelled() {
                return Err(PeerError::ShuttingDown(id));
            }
            attempt += 1;
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Err(PeerError::ShuttingDown(id));
                }
                result = endpoint.connect() => match result {
                    Ok(channel) => {
                        debug!(peer = id, attempt, "Peer channel established");
                        return Ok(channel);
                    }
                    Err(e) => {
                        if attempt == 1 || attempt % 10 == 0 {
                            warn!(peer = id, attempt, "Peer not reachable yet: {}", e);
                        }
                        tokio::select! {
                            _ = self.shutdown.cancelled() => {
                                return Err(PeerError::ShuttingDown(id));
                            }
                            _ = tokio::time::sleep(self.probe_interval) => {}
                        }
                    }
                }
            }
        }
    }

    /// Rewire one ring link on a peer (and possibly elect it anchor).
    pub async fn set_neighbour(
        &self,
        id: u32,
        request: SetNeighbourRequest,
    ) -> Result<SetNeighbourResponse, PeerError> {
        let channel = self.connect(id).await?;
        let mut client = FormationServiceClient::new(channel);
        let response = client
            .set_neighbour(tonic::Request::new(request))
            .await
            .map_err(|status| PeerError::Rpc { id, status })?;
        Ok(response.into_inner())
    }

    /// Forward one angle-wave hop.
    pub async fn propagate_angle(
        &self,
        id: u32,
        target_angle: f64,
        increment: f64,
    ) -> Result<AngleWaveResponse, PeerError> {
        let channel = self.connect(id).await?;
        let mut client = FormationServiceClient::new(channel);
        let response = client
            .propagate_angle(tonic::Request::new(AngleWaveRequest {
                target_angle,
                increment,
            }))
            .await
            .map_err(|status| PeerError::Rpc { id, status })?;
        Ok(response.into_inner())
    }

    /// Subscribe to a peer's periodic status broadcast.
    pub async fn watch_status(
        &self,
        id: u32,
    ) -> Result<tonic::Streaming<StatusUpdate>, PeerError> {
        let channel = self.connect(id).await?;
        let mut client = TelemetryServiceClient::new(channel);
        let response = client
            .watch_status(tonic::Request::new(StatusStreamRequest {}))
            .await
            .map_err(|status| PeerError::Rpc { id, status })?;
        Ok(response.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PeerEntry;

    fn client_with(peers: Vec<PeerEntry>, shutdown: CancellationToken) -> PeerClient {
        let config = DroneConfig {
            peers,
            probe_interval_ms: 20,
            request_timeout_secs: 1,
            ..Default::default()
        };
        PeerClient::new(&config, shutdown)
    }

    #[tokio::test]
    async fn test_unknown_peer_is_rejected() {
        let client = client_with(Vec::new(), CancellationToken::new());
        let err = client.propagate_angle(9, 120.0, 120.0).await.unwrap_err();
        assert!(matches!(err, PeerError::UnknownPeer(9)));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_rejected() {
        let client = client_with(
            vec![PeerEntry {
                id: 2,
                address: "not a uri".to_string(),
            }],
            CancellationToken::new(),
        );
        let err = client.propagate_angle(2, 120.0, 120.0).await.unwrap_err();
        assert!(matches!(err, PeerError::InvalidEndpoint { id: 2, .. }));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_probe_loop() {
        // Nothing listens on this port; the probe loop would retry
        // forever without the cancellation.
        let shutdown = CancellationToken::new();
        let client = client_with(
            vec![PeerEntry {
                id: 2,
                address: "http://127.0.0.1:1".to_string(),
            }],
            shutdown.clone(),
        );

        let cancel = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            client.propagate_angle(2, 120.0, 120.0),
        )
        .await
        .expect("probe loop must stop after cancellation")
        .unwrap_err();
        assert!(matches!(err, PeerError::ShuttingDown(2)));
    }
}
