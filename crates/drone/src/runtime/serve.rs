//! Serve — build the gRPC server and accept connections.

use std::net::SocketAddr;
use std::time::Duration;

use tonic::transport::Server;
use tracing::{error, info};

use crate::proto::{FormationServiceServer, TelemetryServiceServer};
use crate::ring::FormationServiceImpl;
use crate::runtime::boot::DroneNode;
use crate::runtime::stop::shutdown_signal;
use crate::telemetry::TelemetryServiceImpl;

/// Wire up both gRPC services and serve until shutdown.
pub async fn serve(node: DroneNode) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = node.config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let formation = FormationServiceImpl::new(node.handle.clone(), node.peers.clone());
    let telemetry = TelemetryServiceImpl::new(
        node.handle.clone(),
        Duration::from_millis(node.config.status_interval_ms),
        Duration::from_millis(node.config.motion_interval_ms),
    );

    info!("✓ Registered FormationService");
    info!("✓ Registered TelemetryService");
    info!(
        id = node.config.id,
        "Ringform drone node is ready, listening on {}", addr
    );

    let shutdown = node.shutdown.clone();
    Server::builder()
        .add_service(FormationServiceServer::new(formation))
        .add_service(TelemetryServiceServer::new(telemetry))
        .serve_with_shutdown(addr, async move {
            shutdown_signal().await;
            // Unblocks any probe loop still waiting on a peer.
            shutdown.cancel();
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
