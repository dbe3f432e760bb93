//! Subscribe — background watch of the neighbours' status broadcasts.
//!
//! One task per ring side follows whichever peer currently holds that
//! link and feeds its phase angle and radius into the state actor as
//! shadow telemetry. The protocol never reads these fields; they exist
//! for operators inspecting a node's status.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::conf::DroneConfig;
use crate::peer::{PeerClient, PeerError};
use crate::state::{DroneHandle, Side};

/// Spawn the left and right neighbour watchers.
pub fn spawn_subscribers(
    handle: DroneHandle,
    peers: PeerClient,
    config: &DroneConfig,
    shutdown: CancellationToken,
) {
    let retry = Duration::from_millis(config.probe_interval_ms);
    for side in [Side::Left, Side::Right] {
        tokio::spawn(watch_side(
            handle.clone(),
            peers.clone(),
            side,
            retry,
            shutdown.clone(),
        ));
    }
}

fn link_for(side: Side, state: &crate::state::DroneState) -> Option<u32> {
    match side {
        Side::Left => state.neighbour_left,
        Side::Right => state.neighbour_right,
    }
}

/// Sleep between retries, waking early on shutdown. Returns false when
/// the watcher should stop.
async fn pause(retry: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(retry) => true,
    }
}

async fn watch_side(
    handle: DroneHandle,
    peers: PeerClient,
    side: Side,
    retry: Duration,
    shutdown: CancellationToken,
) {
    debug!(side = side.as_str(), "Neighbour watcher started");

    'resolve: loop {
        if shutdown.is_cancelled() {
            break;
        }

        let snap = match handle.snapshot().await {
            Ok(snap) => snap,
            Err(_) => break,
        };
        if snap.land {
            break;
        }

        let Some(peer_id) = link_for(side, &snap) else {
            // No link assigned yet; check again shortly.
            if pause(retry, &shutdown).await {
                continue;
            }
            break;
        };

        let mut stream = match peers.watch_status(peer_id).await {
            Ok(stream) => stream,
            Err(PeerError::ShuttingDown(_)) => break,
            Err(e) => {
                warn!(side = side.as_str(), peer = peer_id, "Status watch failed: {}", e);
                if pause(retry, &shutdown).await {
                    continue;
                }
                break;
            }
        };
        debug!(side = side.as_str(), peer = peer_id, "Following neighbour status");

        loop {
            let message = tokio::select! {
                _ = shutdown.cancelled() => break 'resolve,
                message = stream.message() => message,
            };

            match message {
                Ok(Some(update)) => {
                    handle
                        .neighbour_telemetry(side, update.phase_angle, update.radius)
                        .await;

                    // The link may have been rewired by a leave while
                    // this stream was live; re-resolve if so.
                    match handle.snapshot().await {
                        Ok(snap) if snap.land => break 'resolve,
                        Ok(snap) if link_for(side, &snap) != Some(peer_id) => {
                            debug!(
                                side = side.as_str(),
                                old_peer = peer_id,
                                "Ring link rewired, re-resolving watch"
                            );
                            continue 'resolve;
                        }
                        Ok(_) => {}
                        Err(_) => break 'resolve,
                    }
                }
                Ok(None) => {
                    debug!(side = side.as_str(), peer = peer_id, "Status stream closed");
                    break;
                }
                Err(status) => {
                    warn!(
                        side = side.as_str(),
                        peer = peer_id,
                        "Status stream error: {}",
                        status
                    );
                    break;
                }
            }
        }

        if !pause(retry, &shutdown).await {
            break;
        }
    }

    debug!(side = side.as_str(), "Neighbour watcher stopped");
}
