//! Ring module — the FormationService gRPC surface.

pub mod map;
pub mod route;

pub use route::FormationServiceImpl;
