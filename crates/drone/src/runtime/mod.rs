//! Runtime module — node lifecycle: boot, serve, shutdown.

pub mod boot;
pub mod serve;
pub mod stop;

pub use boot::DroneNode;
