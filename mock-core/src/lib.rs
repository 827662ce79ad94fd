//! # Mock Core
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-memory OperRouter
//! core for integration testing the `operrouter-sdk` transports.
//! It is not intended for production use.
//!
//! [`MockCore`] holds the state and answers calls by JSON-RPC method name, so the
//! HTTP and FFI tests can route requests to it directly. [`MockServer`] exposes the
//! same state through the generated gRPC service.
mod server;
mod state;

pub mod pb {
    tonic::include_proto!("operrouter");
}

pub use state::{DRIVERS, MockCore, NAME, PROVIDERS, VERSION, embedding};
pub use pb::oper_router_server::{OperRouter, OperRouterServer};
pub use server::MockServer;
