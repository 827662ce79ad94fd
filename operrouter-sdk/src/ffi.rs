//! # FFI Transport
//!
//! Calls the native core library in-process through its C ABI.
//!
//! Two wire styles are exposed by the library and both are supported:
//!
//! * **JSON strings** (`operrouter_*`): the request is a borrowed, NUL-terminated JSON
//!   string; the reply is a JSON string owned by the library, released with
//!   `operrouter_free_string`. This is the style behind the
//!   [`OperRouterClient`](crate::OperRouterClient) implementation.
//! * **Protobuf buffers** (`*_proto`): the request is a `(ptr, len)` byte slice; the
//!   reply is a [`ProtoBuffer`] owned by the library, released with
//!   `proto_buffer_free`. Available as inherent methods of [`client::FfiClient`].
//!
//! Every pointer handed back by the library is wrapped in a guard as soon as it is
//! received, so the matching free function runs exactly once on every path, decode
//! failures included.
pub mod buffer;
pub mod client;
pub mod library;

pub use buffer::ProtoBuffer;
pub use library::{FfiBindings, ProtoBindings};

/// Generated messages of `proto/operrouter_ffi.proto`.
pub mod proto {
    tonic::include_proto!("operrouter.ffi");
}

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    #[error(
        "Failed to load the OperRouter FFI library (tried: {tried}): {reason}. \
         Set {env} to the library path or build the library \
         (`cargo build --release` in bridges/operrouter-core-ffi)",
        tried = display_paths(.tried),
        env = library::ENV_LIBRARY_PATH
    )]
    LibraryNotFound { tried: Vec<PathBuf>, reason: String },
    #[error("Symbol '{symbol}' is missing from the FFI library: '{source}'")]
    MissingSymbol {
        symbol: &'static str,
        source: libloading::Error,
    },
    #[error("Symbol '{symbol}' is not exported by the loaded FFI library")]
    Unsupported { symbol: &'static str },
    #[error("Argument of '{symbol}' cannot cross the C boundary: '{source}'")]
    InvalidArgument {
        symbol: &'static str,
        source: std::ffi::NulError,
    },
    #[error("Failed to encode the request of '{symbol}': '{source}'")]
    Encode {
        symbol: &'static str,
        source: serde_json::Error,
    },
    #[error("'{symbol}' returned a null pointer")]
    NullResponse { symbol: &'static str },
    #[error("'{symbol}' returned a string that is not valid UTF-8: '{source}'")]
    InvalidUtf8 {
        symbol: &'static str,
        source: std::str::Utf8Error,
    },
    #[error("Failed to decode the JSON reply of '{symbol}': '{source}'")]
    Decode {
        symbol: &'static str,
        source: serde_json::Error,
    },
    #[error("Failed to decode the protobuf reply of '{symbol}': '{source}'")]
    ProtoDecode {
        symbol: &'static str,
        source: prost::DecodeError,
    },
    #[error("Native call '{symbol}' did not complete: '{source}'")]
    Join {
        symbol: &'static str,
        source: tokio::task::JoinError,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
