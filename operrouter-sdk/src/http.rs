//! # HTTP Transport
//!
//! Reaches the core through JSON-RPC 2.0 over HTTP POST on `{base_url}/jsonrpc`.
//!
//! ## Error Handling
//!
//! - **[`HttpError`]**: the request could not be sent, the server answered with a
//!   non-2xx status, the body was not a JSON-RPC reply, or the reply carried a
//!   JSON-RPC `error` member.
//! - **`success == false` records**: the call went through and the core declined it.
pub mod client;
pub mod jsonrpc;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Failed to build the HTTP client: '{0}'")]
    ClientBuild(#[source] reqwest::Error),
    #[error("Request '{method}' failed to reach the server: '{source}'")]
    Request {
        method: String,
        source: reqwest::Error,
    },
    #[error("Request '{method}' returned HTTP {status}: '{body}'")]
    Status {
        method: String,
        status: StatusCode,
        body: String,
    },
    #[error("RPC error {code} on '{method}': {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
    #[error("Failed to decode the reply of '{method}': '{source}'")]
    Decode {
        method: String,
        source: serde_json::Error,
    },
}
