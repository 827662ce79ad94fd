//! # OperRouter Client Contract
//!
//! This module defines [`OperRouterClient`], the set of operations every transport
//! exposes, together with the value records exchanged with the core.
//!
//! The three implementations ([`HttpClient`], [`GrpcClient`], [`FfiClient`]) are
//! independent types. Callers choose one when they build it, either directly or from
//! a [`TransportConfig`] through [`connect`]:
//!
//! ```rust,no_run
//! use operrouter_sdk::client::{TransportConfig, connect};
//!
//! # async fn run() -> Result<(), operrouter_sdk::Error> {
//! let config: TransportConfig =
//!     serde_json::from_str(r#"{"transport": "grpc", "address": "http://localhost:50051"}"#)
//!         .expect("valid transport config");
//!
//! let client = connect(&config).await?;
//! let metadata = client.get_metadata().await?;
//! println!("{} {}", metadata.name, metadata.version);
//! # Ok(())
//! # }
//! ```
//!
//! ## Contract
//!
//! Every operation performs a single call, with no implicit retries. A reply where the
//! core declined the request is returned as `Ok` with `success == false`; only
//! transport failures surface as [`Error`].
mod types;
mod value;

pub use types::*;
pub use value::{Row, Value};

use crate::{
    error::Error,
    ffi::client::FfiClient,
    grpc::client::GrpcClient,
    http::client::{HttpClient, HttpClientConfig},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// The operations offered by an OperRouter core, whatever the transport.
#[async_trait]
pub trait OperRouterClient: Send + Sync {
    /// Checks that the core is reachable.
    async fn ping(&self) -> Result<PingResponse, Error>;

    /// Asks the core to validate an operator configuration.
    async fn validate_config(&self, config: &serde_json::Value) -> Result<ConfigResponse, Error>;

    /// Asks the core to load a configuration file from a path it can read.
    async fn load_config(&self, path: &str) -> Result<ConfigResponse, Error>;

    /// Returns the descriptive metadata of the core.
    async fn get_metadata(&self) -> Result<Metadata, Error>;

    /// Creates a data source connection named `name`.
    async fn create_datasource(
        &self,
        name: &str,
        config: &DataSourceConfig,
    ) -> Result<DataSourceResponse, Error>;

    /// Runs a read query and returns the rows.
    async fn query_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceQueryResponse, Error>;

    /// Runs a write or DDL statement.
    async fn execute_datasource(&self, name: &str, query: &str)
    -> Result<DataSourceResponse, Error>;

    /// Inserts a single row.
    async fn insert_datasource(&self, name: &str, row: &Row) -> Result<DataSourceResponse, Error>;

    /// Checks the health of a data source. Succeeds if the core reports it healthy.
    async fn ping_datasource(&self, name: &str) -> Result<DataSourceResponse, Error>;

    /// Closes a data source connection.
    async fn close_datasource(&self, name: &str) -> Result<DataSourceResponse, Error>;

    /// Creates an LLM instance named `name`.
    async fn create_llm(&self, name: &str, config: &LlmConfig) -> Result<LlmResponse, Error>;

    /// Generates a completion for a single prompt.
    async fn generate_llm(&self, name: &str, prompt: &str) -> Result<LlmGenerateResponse, Error>;

    /// Sends a conversation, in order, and returns the reply.
    async fn chat_llm(
        &self,
        name: &str,
        messages: &[ChatMessage],
    ) -> Result<LlmChatResponse, Error>;

    /// Computes an embedding vector for `text`.
    async fn embedding_llm(&self, name: &str, text: &str) -> Result<LlmEmbeddingResponse, Error>;

    /// Checks the health of an LLM instance. Succeeds if the core reports it healthy.
    async fn ping_llm(&self, name: &str) -> Result<LlmResponse, Error>;

    /// Closes an LLM instance.
    async fn close_llm(&self, name: &str) -> Result<LlmResponse, Error>;
}

/// Selects and configures a transport.
///
/// Deserialized from a JSON object tagged by `transport`:
///
/// ```json
/// { "transport": "http", "base_url": "http://localhost:8080", "timeout_secs": 10 }
/// { "transport": "grpc", "address": "http://localhost:50051" }
/// { "transport": "ffi", "library_path": "/opt/operrouter/liboperrouter_core_ffi.so" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum TransportConfig {
    Http {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Grpc {
        address: String,
    },
    Ffi {
        #[serde(default)]
        library_path: Option<PathBuf>,
    },
}

fn default_timeout_secs() -> u64 {
    HttpClientConfig::DEFAULT_TIMEOUT.as_secs()
}

/// Builds the client described by `config`.
///
/// For gRPC this opens the channel; for FFI it locates and loads the native library.
pub async fn connect(config: &TransportConfig) -> Result<Box<dyn OperRouterClient>, Error> {
    let client: Box<dyn OperRouterClient> = match config {
        TransportConfig::Http {
            base_url,
            timeout_secs,
        } => Box::new(HttpClient::with_config(HttpClientConfig {
            base_url: base_url.clone(),
            timeout: Duration::from_secs(*timeout_secs),
        })?),
        TransportConfig::Grpc { address } => Box::new(GrpcClient::connect(address).await?),
        TransportConfig::Ffi { library_path } => {
            Box::new(FfiClient::load(library_path.as_deref())?)
        }
    };

    Ok(client)
}

/// Health of a pinged resource: the core may answer with either flag.
pub(crate) fn is_healthy(healthy: bool, success: bool) -> bool {
    healthy || success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_is_the_or_of_both_flags() {
        let table = [
            (false, false, false),
            (false, true, true),
            (true, false, true),
            (true, true, true),
        ];

        for (healthy, success, expected) in table {
            assert_eq!(is_healthy(healthy, success), expected);
        }
    }

    #[test]
    fn transport_config_defaults_http_timeout() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"transport": "http", "base_url": "http://core:8080"}"#)
                .unwrap();

        assert_eq!(
            config,
            TransportConfig::Http {
                base_url: "http://core:8080".to_string(),
                timeout_secs: 30,
            }
        );
    }

    #[test]
    fn transport_config_ffi_path_is_optional() {
        let config: TransportConfig = serde_json::from_str(r#"{"transport": "ffi"}"#).unwrap();
        assert_eq!(config, TransportConfig::Ffi { library_path: None });
    }
}
