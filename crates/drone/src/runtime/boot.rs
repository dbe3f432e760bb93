//! Boot — logging init, config load, actor spawn, subscriber start.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::DroneConfig;
use crate::peer::PeerClient;
use crate::state::{spawn, DroneHandle, DroneState};
use crate::telemetry::spawn_subscribers;

/// Everything the serving layer needs about a booted node.
pub struct DroneNode {
    pub config: DroneConfig,
    pub handle: DroneHandle,
    pub peers: PeerClient,
    pub shutdown: CancellationToken,
}

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drone=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load config, spawn the state actor, and start the neighbour
/// status watchers.
pub async fn boot() -> Result<DroneNode, Box<dyn std::error::Error>> {
    info!("Starting Ringform drone node v0.1.0");

    let config = DroneConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!(
        id = config.id,
        bind_address = %config.bind_address,
        ring_size = config.ring_size,
        phase_angle = config.phase_angle,
        radius = config.radius,
        peers = config.peers.len(),
        "Loaded configuration"
    );

    let shutdown = CancellationToken::new();
    let handle = spawn(
        DroneState::new(config.id, config.phase_angle, config.radius),
        config.ring_size,
    );
    let peers = PeerClient::new(&config, shutdown.clone());

    spawn_subscribers(handle.clone(), peers.clone(), &config, shutdown.clone());
    info!("Neighbour status watchers started");

    Ok(DroneNode {
        config,
        handle,
        peers,
        shutdown,
    })
}
