//! Commands — the ring operations the orchestrator can drive.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::client::{DroneClient, Side};
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;

async fn connect(config: &OrchestratorConfig, id: u32) -> Result<DroneClient> {
    let topology = config.topology();
    let address = topology
        .get(&id)
        .ok_or(OrchestratorError::UnknownDrone(id))?;
    let timeout = Duration::from_secs(config.request_timeout_secs);
    DroneClient::connect(id, address, timeout)
        .await
        .with_context(|| format!("connecting to drone {}", id))
}

/// Wire every drone's left and right links per the configured ring
/// order, then elect the anchor. The election call returns only once
/// the angle wave has traversed the whole ring.
pub async fn form(config: &OrchestratorConfig) -> Result<()> {
    let n = config.ring.len();
    for (i, &id) in config.ring.iter().enumerate() {
        let left = config.ring[(i + n - 1) % n];
        let right = config.ring[(i + 1) % n];
        let drone = connect(config, id).await?;
        drone.set_neighbour(false, left, Side::Left).await?;
        drone.set_neighbour(false, right, Side::Right).await?;
        info!(id, left, right, "Ring links assigned");
    }

    let anchor_pos = config
        .ring
        .iter()
        .position(|&id| id == config.anchor)
        .context("anchor is not part of the ring")?;
    let left_of_anchor = config.ring[(anchor_pos + n - 1) % n];

    info!(anchor = config.anchor, "Electing anchor, waiting for the wave to settle");
    let anchor = connect(config, config.anchor).await?;
    anchor
        .set_neighbour(true, left_of_anchor, Side::Left)
        .await?;

    println!("ring formed: {} drones, anchor {}", n, config.anchor);
    Ok(())
}

/// Promote every drone's staged offset to its active motion target.
pub async fn commit(config: &OrchestratorConfig) -> Result<()> {
    for &id in &config.ring {
        let drone = connect(config, id).await?;
        let response = drone.commit_move().await?;
        println!(
            "drone {}: target x={:.3} y={:.3} alpha={:.4}",
            id, response.target_x, response.target_y, response.alpha
        );
    }
    Ok(())
}

/// Drop one drone out of the ring. The drone itself performs the
/// rewiring handshake and the remaining members re-space themselves.
pub async fn drop_member(config: &OrchestratorConfig, id: u32) -> Result<()> {
    let drone = connect(config, id).await?;
    info!(id, "Requesting ring departure");
    drone.leave_ring().await?;
    println!("drone {} left the ring; update the ring order in the config", id);
    Ok(())
}

/// Print a status line per drone.
pub async fn status(config: &OrchestratorConfig) -> Result<()> {
    for endpoint in &config.drones {
        match connect(config, endpoint.id).await {
            Ok(drone) => match drone.get_status().await {
                Ok(s) => {
                    let role = if s.anchor { "anchor" } else { "member" };
                    let state = if s.land { "landing" } else { "in-ring" };
                    println!(
                        "drone {:>3} [{}] {}: phase={:.1} target={:.1} radius={:.2} left={:?} right={:?}",
                        s.id,
                        role,
                        state,
                        s.phase_angle,
                        s.target_phase_angle,
                        s.radius,
                        s.neighbour_left,
                        s.neighbour_right,
                    );
                }
                Err(e) => println!("drone {:>3}: status query failed: {}", endpoint.id, e),
            },
            Err(e) => println!("drone {:>3}: unreachable: {:#}", endpoint.id, e),
        }
    }
    Ok(())
}
