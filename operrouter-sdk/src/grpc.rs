//! # gRPC Transport
//!
//! This module contains the protobuf-typed transport: the generated stubs for the
//! `operrouter.OperRouter` service ([`pb`]), the conversions between the SDK records
//! and the wire messages ([`convert`]), and the [`client::GrpcClient`] itself.
//!
//! ## Error Handling
//!
//! - **[`GrpcError::InvalidUrl`] / [`GrpcError::ConnectionFailed`]**: the channel could
//!   not be established.
//! - **[`GrpcError::Status`]**: the call ran but the server answered with a non-OK
//!   gRPC status (unreachable peer, unimplemented method, service not ready).
pub mod client;
pub mod convert;

/// Generated messages and client stub of `proto/operrouter.proto`.
pub mod pb {
    tonic::include_proto!("operrouter");
}

#[derive(Debug, thiserror::Error)]
pub enum GrpcError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
    #[error("gRPC call '{method}' failed with code {code:?}: {message}", code = .status.code(), message = .status.message())]
    Status {
        method: &'static str,
        #[source]
        status: tonic::Status,
    },
}
