//! # HTTP JSON-RPC Client
//!
//! [`HttpClient`] wraps a pooled `reqwest` client. Every call posts one JSON-RPC
//! envelope to `{base_url}/jsonrpc` and waits for the reply, bounded by the
//! configured timeout. Request ids come from an atomic counter, so a single client
//! can be shared between tasks.
use super::{
    HttpError,
    jsonrpc::{self, RpcError},
};
use crate::{
    client::{
        ChatMessage, ConfigResponse, DataSourceConfig, DataSourceQueryResponse,
        DataSourceResponse, LlmChatResponse, LlmConfig, LlmEmbeddingResponse,
        LlmGenerateResponse, LlmResponse, Metadata, OperRouterClient, PingResponse, Row,
    },
    error::Error,
    wire::{
        ChatParams, CoreReply, CreateDataSourceParams, CreateLlmParams, InsertParams, NameParams,
        PromptParams, QueryParams, TextParams,
    },
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("operrouter-sdk/", env!("CARGO_PKG_VERSION"));

/// Settings of an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Base URL of the core HTTP server, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Upper bound for a whole call, connection included.
    pub timeout: Duration,
}

impl HttpClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-RPC 2.0 client of the core.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpClient {
    /// Creates a client for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_config(HttpClientConfig::new(base_url))
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(HttpError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint: format!("{}/jsonrpc", config.base_url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }

    /// The full URL calls are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Performs one JSON-RPC call and returns the decoded `result` member.
    ///
    /// # Returns
    ///
    /// * `Ok(CoreReply)` - The server answered with a `result` (a missing one decodes as empty).
    /// * `Err(HttpError)` - Network failure, non-2xx status, undecodable body or an `error` member.
    async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<CoreReply, HttpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = jsonrpc::Request::new(id, method, params);

        debug!(method, id, endpoint = %self.endpoint, "sending JSON-RPC request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&envelope)
            .send()
            .await
            .map_err(|source| HttpError::Request {
                method: method.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| HttpError::Request {
                method: method.to_string(),
                source,
            })?;

        if !status.is_success() {
            warn!(method, id, %status, "JSON-RPC request rejected");
            return Err(HttpError::Status {
                method: method.to_string(),
                status,
                body,
            });
        }

        let reply: jsonrpc::Response =
            serde_json::from_str(&body).map_err(|source| HttpError::Decode {
                method: method.to_string(),
                source,
            })?;

        if let Some(member) = reply.error {
            let RpcError {
                code,
                message,
                data,
            } = RpcError::from_member(member);
            warn!(method, id, code, %message, "JSON-RPC error reply");
            return Err(HttpError::Rpc {
                method: method.to_string(),
                code,
                message,
                data,
            });
        }

        let result = reply
            .result
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        serde_json::from_value(result).map_err(|source| HttpError::Decode {
            method: method.to_string(),
            source,
        })
    }
}

/// Params for methods that take none.
fn no_params() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

#[async_trait]
impl OperRouterClient for HttpClient {
    async fn ping(&self) -> Result<PingResponse, Error> {
        Ok(self.call("ping", no_params()).await?.into_ping())
    }

    async fn validate_config(&self, config: &serde_json::Value) -> Result<ConfigResponse, Error> {
        let params = serde_json::json!({ "config": config });
        Ok(self.call("validate_config", params).await?.into_config())
    }

    async fn load_config(&self, path: &str) -> Result<ConfigResponse, Error> {
        let params = serde_json::json!({ "path": path });
        Ok(self.call("load_config", params).await?.into_config())
    }

    async fn get_metadata(&self) -> Result<Metadata, Error> {
        Ok(self.call("get_metadata", no_params()).await?.into_metadata())
    }

    async fn create_datasource(
        &self,
        name: &str,
        config: &DataSourceConfig,
    ) -> Result<DataSourceResponse, Error> {
        let params = CreateDataSourceParams { name, config };
        Ok(self.call("datasource.create", params).await?.into_datasource())
    }

    async fn query_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceQueryResponse, Error> {
        let params = QueryParams { name, query };
        Ok(self.call("datasource.query", params).await?.into_query())
    }

    async fn execute_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceResponse, Error> {
        let params = QueryParams { name, query };
        Ok(self.call("datasource.execute", params).await?.into_datasource())
    }

    async fn insert_datasource(&self, name: &str, row: &Row) -> Result<DataSourceResponse, Error> {
        let params = InsertParams { name, data: row };
        Ok(self.call("datasource.insert", params).await?.into_datasource())
    }

    async fn ping_datasource(&self, name: &str) -> Result<DataSourceResponse, Error> {
        let params = NameParams { name };
        Ok(self
            .call("datasource.ping", params)
            .await?
            .into_datasource_health())
    }

    async fn close_datasource(&self, name: &str) -> Result<DataSourceResponse, Error> {
        let params = NameParams { name };
        Ok(self.call("datasource.close", params).await?.into_datasource())
    }

    async fn create_llm(&self, name: &str, config: &LlmConfig) -> Result<LlmResponse, Error> {
        let params = CreateLlmParams { name, config };
        Ok(self.call("llm.create", params).await?.into_llm())
    }

    async fn generate_llm(&self, name: &str, prompt: &str) -> Result<LlmGenerateResponse, Error> {
        let params = PromptParams { name, prompt };
        Ok(self.call("llm.generate", params).await?.into_generate())
    }

    async fn chat_llm(
        &self,
        name: &str,
        messages: &[ChatMessage],
    ) -> Result<LlmChatResponse, Error> {
        let params = ChatParams { name, messages };
        Ok(self.call("llm.chat", params).await?.into_chat())
    }

    async fn embedding_llm(&self, name: &str, text: &str) -> Result<LlmEmbeddingResponse, Error> {
        let params = TextParams { name, text };
        Ok(self.call("llm.embedding", params).await?.into_embedding())
    }

    async fn ping_llm(&self, name: &str) -> Result<LlmResponse, Error> {
        let params = NameParams { name };
        Ok(self.call("llm.ping", params).await?.into_llm_health())
    }

    async fn close_llm(&self, name: &str) -> Result<LlmResponse, Error> {
        let params = NameParams { name };
        Ok(self.call("llm.close", params).await?.into_llm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slashes() {
        let client = HttpClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/jsonrpc");
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        let config = HttpClientConfig::new("http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
