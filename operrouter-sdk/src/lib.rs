//! # OperRouter SDK
//!
//! `operrouter-sdk` talks to an OperRouter core, the external service that manages
//! data sources (database connections) and LLM provider instances. The SDK has no
//! engine of its own: every call is marshalled, sent over a transport and decoded
//! into a typed response record.
//!
//! ## Key Components
//!
//! * **[`OperRouterClient`]:** The contract shared by every transport. Pick an
//!   implementation at construction time and use it behind `dyn OperRouterClient`.
//! * **[`HttpClient`]:** JSON-RPC 2.0 over HTTP POST.
//! * **[`GrpcClient`]:** Protobuf unary calls over a single long-lived channel.
//! * **[`FfiClient`]:** Direct calls into the native core library through its C ABI.
//!
//! ## Failures
//!
//! A call that reached the core and was declined (unknown resource, bad config,
//! unhealthy connection) is **not** an error: it returns a record with
//! `success == false` and a message. [`Error`] is reserved for transport failures,
//! when no record can be built at all.
//!
//! ```rust,no_run
//! use operrouter_sdk::{HttpClient, OperRouterClient};
//!
//! # async fn run() -> Result<(), operrouter_sdk::Error> {
//! let client = HttpClient::new("http://localhost:8080")?;
//! let pong = client.ping().await?;
//! assert!(pong.success);
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `tonic` so consumers building custom channels use
//! compatible versions.
pub mod client;
pub mod error;
pub mod ffi;
pub mod grpc;
pub mod http;
mod wire;

pub use client::{
    ChatMessage, ConfigResponse, DataSourceConfig, DataSourceQueryResponse, DataSourceResponse,
    LlmChatResponse, LlmConfig, LlmEmbeddingResponse, LlmGenerateResponse, LlmResponse,
    Metadata, OperRouterClient, PingResponse, Role, Row, TransportConfig, Value, connect,
};
pub use error::Error;
pub use ffi::client::FfiClient;
pub use grpc::client::GrpcClient;
pub use http::client::{HttpClient, HttpClientConfig};

// Re-exports
pub use prost;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
