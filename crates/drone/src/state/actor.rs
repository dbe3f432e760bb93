//! Actor — serialized ownership of DroneState behind a command mailbox.
//!
//! Every gRPC handler talks to the drone through a `DroneHandle`. The
//! actor task is the only owner of the state, so handler execution is
//! mutually exclusive by construction and "one wave in flight" holds
//! as a guarantee rather than a convention.
//!
//! The actor never performs network I/O. Commands that require an
//! outbound peer call return a *plan* (`WaveSeed`, `LeavePlan`) and the
//! calling handler performs the RPC outside the mailbox. This is what
//! lets the anchor process the terminal wave hop while its own
//! SetNeighbour handler is still awaiting the ring traversal.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::formation::{chord_offset, spacing, wrap_degrees, Offset};

use super::drone::DroneState;

/// Which ring link a neighbour assignment touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// The next hop of an angle wave, to be sent by the handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSeed {
    pub next_hop: u32,
    pub target_angle: f64,
    pub increment: f64,
}

/// Outcome of staging an inbound wave hop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveStep {
    /// Not the anchor: forward the wave to the right neighbour.
    Forward(WaveSeed),
    /// The wave came back to the anchor; the traversal is complete.
    Terminated,
}

/// The two rewiring calls a leaving drone must issue, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePlan {
    /// Current right neighbour; receives our left link (step 1).
    pub right_id: u32,
    /// Current left neighbour; becomes anchor and receives our right
    /// link (step 2, only after step 1 acknowledged).
    pub left_id: u32,
    /// Effective ring size the new anchor should seed its wave with.
    pub ring_size: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("drone {0} is landing; the ring protocol is closed for it")]
    Landed(u32),

    #[error("{0} neighbour is not assigned")]
    MissingNeighbour(&'static str),

    #[error("ring size {0} cannot seed a wave; need at least 3 members")]
    RingSize(u32),

    #[error("target angle {0} is outside [0, 360) degrees")]
    AngleDomain(String),

    #[error("increment {0} is outside (0, 360) degrees")]
    IncrementDomain(String),

    #[error("drone actor is no longer running")]
    Closed,
}

/// Mailbox protocol between gRPC handlers and the state actor.
#[derive(Debug)]
pub enum Command {
    SetNeighbour {
        anchor: bool,
        neighbour_id: u32,
        side: Side,
        /// Override for the configured ring size (post-leave re-election).
        ring_size: Option<u32>,
        reply: oneshot::Sender<Result<Option<WaveSeed>, StateError>>,
    },
    StageWave {
        target_angle: f64,
        increment: f64,
        reply: oneshot::Sender<Result<WaveStep, StateError>>,
    },
    CommitMove {
        reply: oneshot::Sender<Result<Offset, StateError>>,
    },
    PlanLeave {
        reply: oneshot::Sender<Result<LeavePlan, StateError>>,
    },
    /// Both rewiring calls acknowledged; mark the drone as landing.
    FinishLeave {
        reply: oneshot::Sender<()>,
    },
    NeighbourTelemetry {
        side: Side,
        phase_angle: f64,
        radius: f64,
    },
    Snapshot {
        reply: oneshot::Sender<DroneState>,
    },
}

/// Cloneable handle to the state actor.
#[derive(Clone)]
pub struct DroneHandle {
    tx: mpsc::Sender<Command>,
}

/// Spawn the state actor and return its handle.
///
/// `ring_size` is the configured formation size; individual anchor
/// elections may override it per request.
pub fn spawn(state: DroneState, ring_size: u32) -> DroneHandle {
    let (tx, rx) = mpsc::channel(32);
    let actor = DroneActor {
        state,
        ring_size,
        rx,
    };
    tokio::spawn(actor.run());
    DroneHandle { tx }
}

impl DroneHandle {
    pub async fn set_neighbour(
        &self,
        anchor: bool,
        neighbour_id: u32,
        side: Side,
        ring_size: Option<u32>,
    ) -> Result<Option<WaveSeed>, StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::SetNeighbour {
                anchor,
                neighbour_id,
                side,
                ring_size,
                reply,
            })
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)?
    }

    pub async fn stage_wave(
        &self,
        target_angle: f64,
        increment: f64,
    ) -> Result<WaveStep, StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::StageWave {
                target_angle,
                increment,
                reply,
            })
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)?
    }

    pub async fn commit_move(&self) -> Result<Offset, StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::CommitMove { reply })
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)?
    }

    pub async fn plan_leave(&self) -> Result<LeavePlan, StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::PlanLeave { reply })
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)?
    }

    pub async fn finish_leave(&self) -> Result<(), StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::FinishLeave { reply })
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)
    }

    pub async fn neighbour_telemetry(&self, side: Side, phase_angle: f64, radius: f64) {
        // Telemetry is fire-and-forget; a full mailbox or stopped
        // actor just drops the sample.
        let _ = self
            .tx
            .send(Command::NeighbourTelemetry {
                side,
                phase_angle,
                radius,
            })
            .await;
    }

    pub async fn snapshot(&self) -> Result<DroneState, StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)
    }
}

struct DroneActor {
    state: DroneState,
    ring_size: u32,
    rx: mpsc::Receiver<Command>,
}

impl DroneActor {
    async fn run(mut self) {
        debug!(id = self.state.id, "Drone state actor started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command);
        }
        debug!(id = self.state.id, "Drone state actor stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetNeighbour {
                anchor,
                neighbour_id,
                side,
                ring_size,
                reply,
            } => {
                let _ = reply.send(self.set_neighbour(anchor, neighbour_id, side, ring_size));
            }
            Command::StageWave {
                target_angle,
                increment,
                reply,
            } => {
                let _ = reply.send(self.stage_wave(target_angle, increment));
            }
            Command::CommitMove { reply } => {
                let _ = reply.send(self.commit_move());
            }
            Command::PlanLeave { reply } => {
                let _ = reply.send(self.plan_leave());
            }
            Command::FinishLeave { reply } => {
                self.state.land = true;
                info!(id = self.state.id, "Drone dropped from ring, landing");
                let _ = reply.send(());
            }
            Command::NeighbourTelemetry {
                side,
                phase_angle,
                radius,
            } => match side {
                Side::Left => {
                    self.state.phase_angle_left = Some(phase_angle);
                    self.state.radius_left = Some(radius);
                }
                Side::Right => {
                    self.state.phase_angle_right = Some(phase_angle);
                    self.state.radius_right = Some(radius);
                }
            },
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
        }
    }

    fn ensure_in_ring(&self) -> Result<(), StateError> {
        if self.state.land {
            Err(StateError::Landed(self.state.id))
        } else {
            Ok(())
        }
    }

    fn set_neighbour(
        &mut self,
        anchor: bool,
        neighbour_id: u32,
        side: Side,
        ring_size: Option<u32>,
    ) -> Result<Option<WaveSeed>, StateError> {
        self.ensure_in_ring()?;

        let n = ring_size.unwrap_or(self.ring_size);
        if anchor && n < 3 {
            return Err(StateError::RingSize(n));
        }

        // Election preconditions are checked before any mutation so a
        // rejected request leaves no half-elected anchor behind.
        let next_hop = if anchor {
            let right = match side {
                Side::Right => Some(neighbour_id),
                Side::Left => self.state.neighbour_right,
            };
            Some(right.ok_or(StateError::MissingNeighbour("right"))?)
        } else {
            None
        };

        match side {
            Side::Left => self.state.neighbour_left = Some(neighbour_id),
            Side::Right => self.state.neighbour_right = Some(neighbour_id),
        }
        // An explicit anchor=false demotes, so a drone rewired during a
        // leave cannot linger as a second anchor.
        self.state.anchor = anchor;

        info!(
            id = self.state.id,
            anchor = self.state.anchor,
            neighbour_left = ?self.state.neighbour_left,
            neighbour_right = ?self.state.neighbour_right,
            "Ring link updated: {} neighbour is now {}",
            side.as_str(),
            neighbour_id
        );

        let Some(next_hop) = next_hop else {
            return Ok(None);
        };

        // Anchor election: hold position and seed the wave.
        let increment = spacing(n);
        self.state.target_phase_angle = self.state.phase_angle;
        let target_angle = wrap_degrees(self.state.phase_angle + increment);

        info!(
            id = self.state.id,
            increment, target_angle, next_hop, "Elected anchor, seeding angle wave"
        );

        Ok(Some(WaveSeed {
            next_hop,
            target_angle,
            increment,
        }))
    }

    fn stage_wave(&mut self, target_angle: f64, increment: f64) -> Result<WaveStep, StateError> {
        self.ensure_in_ring()?;

        if !(0.0..360.0).contains(&target_angle) {
            return Err(StateError::AngleDomain(format!("{}", target_angle)));
        }
        if !(increment > 0.0 && increment < 360.0) {
            return Err(StateError::IncrementDomain(format!("{}", increment)));
        }

        if self.state.anchor {
            info!(
                id = self.state.id,
                target_phase_angle = self.state.target_phase_angle,
                "Angle wave returned to anchor, traversal complete"
            );
            return Ok(WaveStep::Terminated);
        }

        self.state.target_phase_angle = target_angle;
        let offset = chord_offset(self.state.phase_angle, target_angle, self.state.radius);
        self.state.staged = offset;

        let next_hop = self
            .state
            .neighbour_right
            .ok_or(StateError::MissingNeighbour("right"))?;
        let next_target = wrap_degrees(target_angle + increment);

        info!(
            id = self.state.id,
            target_angle,
            staged_x = offset.x,
            staged_y = offset.y,
            alpha = offset.alpha,
            next_hop,
            "Staged chord offset, forwarding wave"
        );

        Ok(WaveStep::Forward(WaveSeed {
            next_hop,
            target_angle: next_target,
            increment,
        }))
    }

    fn commit_move(&mut self) -> Result<Offset, StateError> {
        self.ensure_in_ring()?;
        // Idempotent: re-commits without an intervening wave copy the
        // same staged values.
        self.state.active = self.state.staged;
        info!(
            id = self.state.id,
            x = self.state.active.x,
            y = self.state.active.y,
            alpha = self.state.active.alpha,
            "Committed motion target"
        );
        Ok(self.state.active)
    }

    fn plan_leave(&self) -> Result<LeavePlan, StateError> {
        self.ensure_in_ring()?;
        let right_id = self
            .state
            .neighbour_right
            .ok_or(StateError::MissingNeighbour("right"))?;
        let left_id = self
            .state
            .neighbour_left
            .ok_or(StateError::MissingNeighbour("left"))?;
        // One fewer member after we are gone; the new anchor seeds its
        // wave over the shrunken ring.
        let ring_size = self.ring_size.saturating_sub(1);
        if ring_size < 3 {
            return Err(StateError::RingSize(ring_size));
        }
        Ok(LeavePlan {
            right_id,
            left_id,
            ring_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: u32, phase: f64, radius: f64, ring_size: u32) -> DroneHandle {
        spawn(DroneState::new(id, phase, radius), ring_size)
    }

    #[tokio::test]
    async fn test_set_neighbour_updates_links() {
        let drone = handle(1, 0.0, 2.0, 4);
        let seed = drone
            .set_neighbour(false, 2, Side::Right, None)
            .await
            .unwrap();
        assert!(seed.is_none());
        let seed = drone
            .set_neighbour(false, 4, Side::Left, None)
            .await
            .unwrap();
        assert!(seed.is_none());

        let snap = drone.snapshot().await.unwrap();
        assert_eq!(snap.neighbour_right, Some(2));
        assert_eq!(snap.neighbour_left, Some(4));
        assert!(!snap.anchor);
    }

    #[tokio::test]
    async fn test_anchor_election_seeds_wave() {
        let drone = handle(1, 30.0, 2.0, 4);
        drone
            .set_neighbour(false, 2, Side::Right, None)
            .await
            .unwrap();
        let seed = drone
            .set_neighbour(true, 4, Side::Left, None)
            .await
            .unwrap()
            .expect("anchor election should seed a wave");

        assert_eq!(seed.next_hop, 2);
        assert!((seed.increment - 120.0).abs() < 1e-9);
        assert!((seed.target_angle - 150.0).abs() < 1e-9);

        let snap = drone.snapshot().await.unwrap();
        assert!(snap.anchor);
        // The anchor holds its position.
        assert!((snap.target_phase_angle - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_anchor_election_ring_size_override() {
        let drone = handle(1, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 2, Side::Right, None)
            .await
            .unwrap();
        let seed = drone
            .set_neighbour(true, 4, Side::Left, Some(3))
            .await
            .unwrap()
            .expect("seed");
        assert!((seed.increment - 180.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_anchor_election_requires_right_neighbour() {
        let drone = handle(1, 0.0, 2.0, 4);
        let err = drone
            .set_neighbour(true, 4, Side::Left, None)
            .await
            .unwrap_err();
        assert_eq!(err, StateError::MissingNeighbour("right"));

        // The rejected election must not leave a half-elected anchor:
        // neither the role nor the requested link may stick.
        let snap = drone.snapshot().await.unwrap();
        assert!(!snap.anchor);
        assert_eq!(snap.neighbour_left, None);
        assert_eq!(snap.neighbour_right, None);
    }

    #[tokio::test]
    async fn test_anchor_election_via_right_link_assignment() {
        // Electing through the right-side assignment itself: the link
        // being set is the wave's first hop.
        let drone = handle(1, 0.0, 2.0, 4);
        let seed = drone
            .set_neighbour(true, 2, Side::Right, None)
            .await
            .unwrap()
            .expect("election with a right link must seed");
        assert_eq!(seed.next_hop, 2);

        let snap = drone.snapshot().await.unwrap();
        assert!(snap.anchor);
        assert_eq!(snap.neighbour_right, Some(2));
    }

    #[tokio::test]
    async fn test_anchor_election_rejects_tiny_ring() {
        let drone = handle(1, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 2, Side::Right, None)
            .await
            .unwrap();
        let err = drone
            .set_neighbour(true, 4, Side::Left, Some(2))
            .await
            .unwrap_err();
        assert_eq!(err, StateError::RingSize(2));
    }

    #[tokio::test]
    async fn test_stage_wave_computes_offset_and_forwards() {
        let drone = handle(2, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 3, Side::Right, None)
            .await
            .unwrap();

        let step = drone.stage_wave(120.0, 120.0).await.unwrap();
        let seed = match step {
            WaveStep::Forward(seed) => seed,
            WaveStep::Terminated => panic!("non-anchor must forward"),
        };
        assert_eq!(seed.next_hop, 3);
        assert!((seed.target_angle - 240.0).abs() < 1e-9);

        let snap = drone.snapshot().await.unwrap();
        assert!((snap.target_phase_angle - 120.0).abs() < 1e-9);
        // 120 degrees on radius 2: chord = 2*sqrt(3).
        let chord = (snap.staged.x.powi(2) + snap.staged.y.powi(2)).sqrt();
        assert!((chord - 2.0 * 3.0_f64.sqrt()).abs() < 1e-9);
        assert!(snap.staged.y < 0.0);
    }

    #[tokio::test]
    async fn test_stage_wave_wraps_next_target() {
        let drone = handle(4, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 1, Side::Right, None)
            .await
            .unwrap();
        let step = drone.stage_wave(240.0, 120.0).await.unwrap();
        match step {
            WaveStep::Forward(seed) => assert!(seed.target_angle.abs() < 1e-9),
            WaveStep::Terminated => panic!("non-anchor must forward"),
        }
    }

    #[tokio::test]
    async fn test_stage_wave_terminates_at_anchor() {
        let drone = handle(1, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 2, Side::Right, None)
            .await
            .unwrap();
        drone
            .set_neighbour(true, 4, Side::Left, None)
            .await
            .unwrap();

        let step = drone.stage_wave(0.0, 120.0).await.unwrap();
        assert_eq!(step, WaveStep::Terminated);
        // The anchor's own target is untouched by the returning wave.
        let snap = drone.snapshot().await.unwrap();
        assert!((snap.target_phase_angle - 0.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stage_wave_validates_domains() {
        let drone = handle(2, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 3, Side::Right, None)
            .await
            .unwrap();

        assert!(matches!(
            drone.stage_wave(360.0, 120.0).await.unwrap_err(),
            StateError::AngleDomain(_)
        ));
        assert!(matches!(
            drone.stage_wave(-0.1, 120.0).await.unwrap_err(),
            StateError::AngleDomain(_)
        ));
        assert!(matches!(
            drone.stage_wave(10.0, 0.0).await.unwrap_err(),
            StateError::IncrementDomain(_)
        ));
        assert!(matches!(
            drone.stage_wave(10.0, 360.0).await.unwrap_err(),
            StateError::IncrementDomain(_)
        ));
    }

    #[tokio::test]
    async fn test_commit_move_is_idempotent() {
        let drone = handle(2, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 3, Side::Right, None)
            .await
            .unwrap();
        drone.stage_wave(120.0, 120.0).await.unwrap();

        let first = drone.commit_move().await.unwrap();
        let second = drone.commit_move().await.unwrap();
        assert_eq!(first, second);

        let snap = drone.snapshot().await.unwrap();
        assert_eq!(snap.active, snap.staged);
    }

    #[tokio::test]
    async fn test_commit_before_any_wave_is_zero() {
        let drone = handle(2, 0.0, 2.0, 4);
        let offset = drone.commit_move().await.unwrap();
        assert_eq!(offset, Offset::default());
    }

    #[tokio::test]
    async fn test_plan_leave_requires_both_links() {
        let drone = handle(3, 0.0, 2.0, 4);
        assert_eq!(
            drone.plan_leave().await.unwrap_err(),
            StateError::MissingNeighbour("right")
        );
        drone
            .set_neighbour(false, 4, Side::Right, None)
            .await
            .unwrap();
        assert_eq!(
            drone.plan_leave().await.unwrap_err(),
            StateError::MissingNeighbour("left")
        );
    }

    #[tokio::test]
    async fn test_plan_leave_shrinks_ring() {
        let drone = handle(3, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 4, Side::Right, None)
            .await
            .unwrap();
        drone
            .set_neighbour(false, 2, Side::Left, None)
            .await
            .unwrap();

        let plan = drone.plan_leave().await.unwrap();
        assert_eq!(plan.right_id, 4);
        assert_eq!(plan.left_id, 2);
        assert_eq!(plan.ring_size, 3);

        // Planning alone must not mutate anything.
        let snap = drone.snapshot().await.unwrap();
        assert!(!snap.land);
    }

    #[tokio::test]
    async fn test_plan_leave_rejects_unwaveable_remainder() {
        let drone = handle(3, 0.0, 2.0, 3);
        drone
            .set_neighbour(false, 1, Side::Right, None)
            .await
            .unwrap();
        drone
            .set_neighbour(false, 2, Side::Left, None)
            .await
            .unwrap();
        assert_eq!(drone.plan_leave().await.unwrap_err(), StateError::RingSize(2));
    }

    #[tokio::test]
    async fn test_land_is_terminal() {
        let drone = handle(3, 0.0, 2.0, 4);
        drone
            .set_neighbour(false, 4, Side::Right, None)
            .await
            .unwrap();
        drone.finish_leave().await.unwrap();

        let snap = drone.snapshot().await.unwrap();
        assert!(snap.land);

        assert_eq!(
            drone
                .set_neighbour(false, 1, Side::Left, None)
                .await
                .unwrap_err(),
            StateError::Landed(3)
        );
        assert_eq!(
            drone.stage_wave(10.0, 120.0).await.unwrap_err(),
            StateError::Landed(3)
        );
        assert_eq!(drone.commit_move().await.unwrap_err(), StateError::Landed(3));
        assert_eq!(drone.plan_leave().await.unwrap_err(), StateError::Landed(3));
    }

    #[tokio::test]
    async fn test_neighbour_telemetry_fills_shadow_fields() {
        let drone = handle(1, 0.0, 2.0, 4);
        drone.neighbour_telemetry(Side::Left, 240.0, 2.5).await;
        drone.neighbour_telemetry(Side::Right, 120.0, 2.0).await;

        let snap = drone.snapshot().await.unwrap();
        assert_eq!(snap.phase_angle_left, Some(240.0));
        assert_eq!(snap.radius_left, Some(2.5));
        assert_eq!(snap.phase_angle_right, Some(120.0));
        assert_eq!(snap.radius_right, Some(2.0));
    }
}
