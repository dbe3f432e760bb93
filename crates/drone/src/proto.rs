//! Proto — generated gRPC code for the ring-wave protocol.

// Include the generated protobuf code
pub mod pb {
    tonic::include_proto!("ringform.drone");
}

pub use pb::{
    formation_service_client::FormationServiceClient,
    formation_service_server::{FormationService, FormationServiceServer},
    telemetry_service_client::TelemetryServiceClient,
    telemetry_service_server::{TelemetryService, TelemetryServiceServer},
    // Request/Response types
    SetNeighbourRequest, SetNeighbourResponse,
    AngleWaveRequest, AngleWaveResponse,
    CommitMoveRequest, CommitMoveResponse,
    LeaveRingRequest, LeaveRingResponse,
    StatusRequest, StatusStreamRequest, MotionStreamRequest,
    StatusUpdate, MotionUpdate,
    // Enums
    Side,
};
