//! Route — TelemetryService gRPC handler.
//!
//! `WatchStatus` and `WatchMotion` are the periodic broadcasts of the
//! node: each subscriber gets its own ticker sampling the state actor,
//! so a slow consumer never stalls the protocol handlers.

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use tokio::time::MissedTickBehavior;
use tokio_stream::Stream;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::proto::{
    MotionStreamRequest, MotionUpdate, StatusRequest, StatusStreamRequest, StatusUpdate,
    TelemetryService,
};
use crate::ring::map::map_state_error;
use crate::state::{DroneHandle, DroneState};

pub struct TelemetryServiceImpl {
    handle: DroneHandle,
    status_interval: Duration,
    motion_interval: Duration,
}

impl TelemetryServiceImpl {
    pub fn new(handle: DroneHandle, status_interval: Duration, motion_interval: Duration) -> Self {
        Self {
            handle,
            status_interval,
            motion_interval,
        }
    }
}

fn status_update(state: &DroneState) -> StatusUpdate {
    StatusUpdate {
        id: state.id,
        anchor: state.anchor,
        phase_angle: state.phase_angle,
        radius: state.radius,
        neighbour_left: state.neighbour_left,
        neighbour_right: state.neighbour_right,
        target_phase_angle: state.target_phase_angle,
        land: state.land,
        phase_angle_left: state.phase_angle_left,
        phase_angle_right: state.phase_angle_right,
        radius_left: state.radius_left,
        radius_right: state.radius_right,
        unix_ms: chrono::Utc::now().timestamp_millis(),
    }
}

fn motion_update(state: &DroneState) -> MotionUpdate {
    MotionUpdate {
        target_x: state.active.x,
        target_y: state.active.y,
        alpha: state.active.alpha,
        land: state.land,
        unix_ms: chrono::Utc::now().timestamp_millis(),
    }
}

#[tonic::async_trait]
impl TelemetryService for TelemetryServiceImpl {
    async fn get_status(
        &self,
        _request: Request<StatusRequest>,
    ) -> Result<Response<StatusUpdate>, Status> {
        let snap = self.handle.snapshot().await.map_err(map_state_error)?;
        Ok(Response::new(status_update(&snap)))
    }

    type WatchStatusStream = Pin<Box<dyn Stream<Item = Result<StatusUpdate, Status>> + Send>>;

    async fn watch_status(
        &self,
        _request: Request<StatusStreamRequest>,
    ) -> Result<Response<Self::WatchStatusStream>, Status> {
        let handle = self.handle.clone();
        let period = self.status_interval;
        debug!(period_ms = period.as_millis() as u64, "Status watch opened");

        let stream = try_stream! {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let snap = handle.snapshot().await.map_err(map_state_error)?;
                yield status_update(&snap);
            }
        };

        Ok(Response::new(Box::pin(stream)))
    }

    type WatchMotionStream = Pin<Box<dyn Stream<Item = Result<MotionUpdate, Status>> + Send>>;

    async fn watch_motion(
        &self,
        _request: Request<MotionStreamRequest>,
    ) -> Result<Response<Self::WatchMotionStream>, Status> {
        let handle = self.handle.clone();
        let period = self.motion_interval;
        debug!(period_ms = period.as_millis() as u64, "Motion watch opened");

        let stream = try_stream! {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let snap = handle.snapshot().await.map_err(map_state_error)?;
                yield motion_update(&snap);
            }
        };

        Ok(Response::new(Box::pin(stream)))
    }
}
