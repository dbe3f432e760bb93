//! Formation module — pure circle geometry for the angle wave.

pub mod angle;
pub mod chord;

pub use angle::{shortest_arc, spacing, wrap_degrees};
pub use chord::{chord_offset, Offset};
