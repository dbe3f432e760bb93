//! Drone — the per-agent ring state record.

use crate::formation::Offset;

/// Everything one drone knows about itself and its place in the ring.
///
/// A single `DroneState` exists per node and is owned exclusively by
/// the state actor; handlers never touch it directly.
#[derive(Debug, Clone)]
pub struct DroneState {
    pub id: u32,
    /// Exactly one drone in a consistent ring holds this.
    pub anchor: bool,
    pub neighbour_left: Option<u32>,
    pub neighbour_right: Option<u32>,
    /// Current angular position on the formation circle, degrees in [0, 360).
    pub phase_angle: f64,
    pub radius: f64,
    /// Angular position assigned by the last wave.
    pub target_phase_angle: f64,
    /// Chord offset staged by the wave, awaiting commit.
    pub staged: Offset,
    /// Committed motion target consumed by flight control.
    pub active: Offset,
    /// Terminal: once set the drone is leaving the ring for good.
    pub land: bool,
    // Shadow telemetry cached from neighbour status broadcasts.
    // Never read by the protocol handlers.
    pub phase_angle_left: Option<f64>,
    pub phase_angle_right: Option<f64>,
    pub radius_left: Option<f64>,
    pub radius_right: Option<f64>,
}

impl DroneState {
    pub fn new(id: u32, phase_angle: f64, radius: f64) -> Self {
        Self {
            id,
            anchor: false,
            neighbour_left: None,
            neighbour_right: None,
            phase_angle,
            radius,
            target_phase_angle: phase_angle,
            staged: Offset::default(),
            active: Offset::default(),
            land: false,
            phase_angle_left: None,
            phase_angle_right: None,
            radius_left: None,
            radius_right: None,
        }
    }
}
