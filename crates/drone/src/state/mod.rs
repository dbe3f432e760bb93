//! State module — the drone's ring state and its single-owner actor.

pub mod actor;
pub mod drone;

pub use actor::{spawn, Command, DroneHandle, LeavePlan, Side, StateError, WaveSeed, WaveStep};
pub use drone::DroneState;
