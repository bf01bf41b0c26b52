//! Network layer: the gRPC listener and its service handlers.
pub mod grpc;
pub use grpc::*;
