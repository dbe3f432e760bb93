//! Telemetry module — status / motion broadcasts and neighbour watches.

pub mod route;
pub mod subscribe;

pub use route::TelemetryServiceImpl;
pub use subscribe::spawn_subscribers;
