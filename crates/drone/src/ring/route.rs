//! Route — FormationService gRPC handler.
//!
//! Handlers drive the state actor for every mutation and perform the
//! outbound peer calls (wave forwarding, leave rewiring) outside the
//! actor's mailbox, so the node keeps accepting requests while a
//! traversal is in flight.

use tonic::{Request, Response, Status};
use tracing::info;

use crate::peer::PeerClient;
use crate::proto::{
    AngleWaveRequest, AngleWaveResponse, CommitMoveRequest, CommitMoveResponse,
    FormationService, LeaveRingRequest, LeaveRingResponse, SetNeighbourRequest,
    SetNeighbourResponse, Side as ProtoSide,
};
use crate::state::{DroneHandle, Side, WaveStep};

use super::map::{map_peer_error, map_state_error};

/// Implementation of the FormationService gRPC service: neighbour
/// assignment, angle-wave propagation, move commit and the leave
/// handshake.
pub struct FormationServiceImpl {
    handle: DroneHandle,
    peers: PeerClient,
}

impl FormationServiceImpl {
    pub fn new(handle: DroneHandle, peers: PeerClient) -> Self {
        Self { handle, peers }
    }
}

fn decode_side(side: i32) -> Result<Side, Status> {
    match ProtoSide::try_from(side) {
        Ok(ProtoSide::Left) => Ok(Side::Left),
        Ok(ProtoSide::Right) => Ok(Side::Right),
        _ => Err(Status::invalid_argument("side must be left or right")),
    }
}

#[tonic::async_trait]
impl FormationService for FormationServiceImpl {
    async fn set_neighbour(
        &self,
        request: Request<SetNeighbourRequest>,
    ) -> Result<Response<SetNeighbourResponse>, Status> {
        let req = request.into_inner();
        let side = decode_side(req.side)?;
        let ring_size = (req.ring_size != 0).then_some(req.ring_size);

        info!(
            anchor = req.anchor,
            neighbour_id = req.neighbour_id,
            side = side.as_str(),
            ring_size = ?ring_size,
            "Neighbour assignment received"
        );

        let seed = self
            .handle
            .set_neighbour(req.anchor, req.neighbour_id, side, ring_size)
            .await
            .map_err(map_state_error)?;

        // Anchor election: the wave must complete the full ring
        // traversal before this assignment is acknowledged.
        if let Some(seed) = seed {
            self.peers
                .propagate_angle(seed.next_hop, seed.target_angle, seed.increment)
                .await
                .map_err(map_peer_error)?;
            info!(next_hop = seed.next_hop, "Angle wave settled across the ring");
        }

        Ok(Response::new(SetNeighbourResponse {
            success: true,
            reason: String::new(),
        }))
    }

    async fn propagate_angle(
        &self,
        request: Request<AngleWaveRequest>,
    ) -> Result<Response<AngleWaveResponse>, Status> {
        let req = request.into_inner();

        info!(
            target_angle = req.target_angle,
            increment = req.increment,
            "Angle wave hop received"
        );

        let step = self
            .handle
            .stage_wave(req.target_angle, req.increment)
            .await
            .map_err(map_state_error)?;

        let terminated = match step {
            WaveStep::Forward(seed) => {
                self.peers
                    .propagate_angle(seed.next_hop, seed.target_angle, seed.increment)
                    .await
                    .map_err(map_peer_error)?;
                false
            }
            WaveStep::Terminated => true,
        };

        Ok(Response::new(AngleWaveResponse {
            success: true,
            reason: String::new(),
            terminated,
        }))
    }

    async fn commit_move(
        &self,
        _request: Request<CommitMoveRequest>,
    ) -> Result<Response<CommitMoveResponse>, Status> {
        let offset = self.handle.commit_move().await.map_err(map_state_error)?;

        Ok(Response::new(CommitMoveResponse {
            success: true,
            reason: String::new(),
            target_x: offset.x,
            target_y: offset.y,
            alpha: offset.alpha,
        }))
    }

    async fn leave_ring(
        &self,
        _request: Request<LeaveRingRequest>,
    ) -> Result<Response<LeaveRingResponse>, Status> {
        let plan = self.handle.plan_leave().await.map_err(map_state_error)?;

        info!(
            right_id = plan.right_id,
            left_id = plan.left_id,
            ring_size = plan.ring_size,
            "Leaving ring: rewiring neighbours"
        );

        // Step 1: the right neighbour's left link skips this drone.
        // Must be acknowledged before step 2 so the ring never holds
        // two anchors or a dangling link.
        self.peers
            .set_neighbour(
                plan.right_id,
                SetNeighbourRequest {
                    anchor: false,
                    neighbour_id: plan.left_id,
                    side: ProtoSide::Left as i32,
                    ring_size: 0,
                },
            )
            .await
            .map_err(map_peer_error)?;

        // Step 2: the left neighbour becomes anchor, its right link
        // skips this drone, and it re-seeds a wave over the shrunken
        // ring before acknowledging.
        self.peers
            .set_neighbour(
                plan.left_id,
                SetNeighbourRequest {
                    anchor: true,
                    neighbour_id: plan.right_id,
                    side: ProtoSide::Right as i32,
                    ring_size: plan.ring_size,
                },
            )
            .await
            .map_err(map_peer_error)?;

        // Only after both acknowledgements is the departure recorded.
        self.handle.finish_leave().await.map_err(map_state_error)?;

        Ok(Response::new(LeaveRingResponse {
            success: true,
            reason: String::new(),
        }))
    }
}
