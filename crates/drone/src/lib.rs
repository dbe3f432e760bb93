// Domain-driven module structure for the Ringform drone node.

// Core infrastructure
pub mod proto;
pub mod state;
pub mod formation;

// Domain modules
pub mod runtime;
pub mod conf;
pub mod ring;
pub mod peer;
pub mod telemetry;
