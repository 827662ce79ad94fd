//! # gRPC Client
//!
//! This module wraps the generated `OperRouterClient` stub to implement the
//! [`OperRouterClient`](crate::OperRouterClient) contract.
//!
//! ## How it works
//!
//! The [`GrpcClient`] owns one long-lived channel. Each call clones the stub (a cheap
//! handle on the same channel, multiplexed over HTTP/2), builds the request message
//! through [`super::convert`], performs a unary call and maps the reply back into a
//! record.
//!
//! ## Lifetime
//!
//! The channel is released when the client goes away: either explicitly through
//! [`GrpcClient::close`], or by drop on any other exit path (early `?` return, panic
//! unwinding). Nothing else keeps it open.
//!
//! ## Generic service
//!
//! Like the generated stub, the client is generic over any
//! `tonic::client::GrpcService`. Production code uses a [`Channel`]; tests pass a
//! generated server directly and never open a socket.
use super::{GrpcError, convert, pb, pb::oper_router_client::OperRouterClient as Stub};
use crate::{
    BoxError,
    client::{
        ChatMessage, ConfigResponse, DataSourceConfig, DataSourceQueryResponse,
        DataSourceResponse, LlmChatResponse, LlmConfig, LlmEmbeddingResponse,
        LlmGenerateResponse, LlmResponse, Metadata, OperRouterClient, PingResponse, Row,
        is_healthy, non_empty,
    },
    error::Error,
};
use async_trait::async_trait;
use http_body::Body as HttpBody;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// Protobuf client of the core.
#[derive(Debug, Clone)]
pub struct GrpcClient<S = Channel> {
    stub: Stub<S>,
}

impl GrpcClient<Channel> {
    /// Connects to a core gRPC server.
    ///
    /// # Arguments
    ///
    /// * `addr` - The server address, either a URI (e.g., `http://localhost:50051`) or a
    ///   bare `host:port`, which is reached over plain `http`.
    ///
    /// # Returns
    ///
    /// * `Ok(GrpcClient)` - The connected client.
    /// * `Err(GrpcError)` - If the URL is invalid or connection fails.
    pub async fn connect(addr: &str) -> Result<Self, GrpcError> {
        let endpoint = Endpoint::new(with_scheme(addr))
            .map_err(|e| GrpcError::InvalidUrl(addr.to_string(), e))?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| GrpcError::ConnectionFailed(addr.to_string(), e))?;

        debug!(addr, "gRPC channel established");

        Ok(Self::from_service(channel))
    }
}

impl<S> GrpcClient<S>
where
    S: tonic::client::GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates a client from an existing Tonic service/channel.
    pub fn from_service(service: S) -> Self {
        Self {
            stub: Stub::new(service),
        }
    }

    /// Closes the channel.
    ///
    /// Dropping the client has the same effect; this method makes the end of the
    /// client's scope explicit at the call site.
    pub fn close(self) {
        debug!("closing gRPC channel");
        drop(self);
    }
}

fn with_scheme(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

fn status(method: &'static str) -> impl FnOnce(tonic::Status) -> GrpcError {
    move |status| GrpcError::Status { method, status }
}

#[async_trait]
impl<S> OperRouterClient for GrpcClient<S>
where
    S: tonic::client::GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    async fn ping(&self) -> Result<PingResponse, Error> {
        let reply = self
            .stub
            .clone()
            .ping(pb::PingRequest {})
            .await
            .map_err(status("Ping"))?
            .into_inner();

        Ok(PingResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn validate_config(&self, config: &serde_json::Value) -> Result<ConfigResponse, Error> {
        let request = pb::ValidateConfigRequest {
            config: config.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .validate_config(request)
            .await
            .map_err(status("ValidateConfig"))?
            .into_inner();

        Ok(ConfigResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn load_config(&self, path: &str) -> Result<ConfigResponse, Error> {
        let request = pb::LoadConfigRequest {
            path: path.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .load_config(request)
            .await
            .map_err(status("LoadConfig"))?
            .into_inner();

        Ok(ConfigResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn get_metadata(&self) -> Result<Metadata, Error> {
        let reply = self
            .stub
            .clone()
            .get_metadata(pb::GetMetadataRequest {})
            .await
            .map_err(status("GetMetadata"))?
            .into_inner();

        Ok(reply
            .metadata
            .map(|m| Metadata {
                name: m.name,
                version: m.version,
                description: m.description,
            })
            .unwrap_or_default())
    }

    async fn create_datasource(
        &self,
        name: &str,
        config: &DataSourceConfig,
    ) -> Result<DataSourceResponse, Error> {
        let request = pb::CreateDataSourceRequest {
            name: name.to_string(),
            config: Some(convert::datasource_config(config)),
        };
        let reply = self
            .stub
            .clone()
            .create_data_source(request)
            .await
            .map_err(status("CreateDataSource"))?
            .into_inner();

        Ok(DataSourceResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn query_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceQueryResponse, Error> {
        let request = pb::QueryDataSourceRequest {
            name: name.to_string(),
            query: query.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .query_data_source(request)
            .await
            .map_err(status("QueryDataSource"))?
            .into_inner();

        let rows = reply.rows.into_iter().map(convert::row_from_proto).collect();

        Ok(DataSourceQueryResponse::new(
            reply.success,
            rows,
            non_empty(reply.error),
        ))
    }

    async fn execute_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceResponse, Error> {
        let request = pb::ExecuteDataSourceRequest {
            name: name.to_string(),
            query: query.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .execute_data_source(request)
            .await
            .map_err(status("ExecuteDataSource"))?
            .into_inner();

        Ok(DataSourceResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn insert_datasource(&self, name: &str, row: &Row) -> Result<DataSourceResponse, Error> {
        let request = pb::InsertDataSourceRequest {
            name: name.to_string(),
            data: Some(convert::row_to_proto(row)),
        };
        let reply = self
            .stub
            .clone()
            .insert_data_source(request)
            .await
            .map_err(status("InsertDataSource"))?
            .into_inner();

        Ok(DataSourceResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn ping_datasource(&self, name: &str) -> Result<DataSourceResponse, Error> {
        let request = pb::PingDataSourceRequest {
            name: name.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .ping_data_source(request)
            .await
            .map_err(status("PingDataSource"))?
            .into_inner();

        Ok(DataSourceResponse::new(
            is_healthy(reply.healthy, reply.success),
            non_empty(reply.error),
        ))
    }

    async fn close_datasource(&self, name: &str) -> Result<DataSourceResponse, Error> {
        let request = pb::CloseDataSourceRequest {
            name: name.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .close_data_source(request)
            .await
            .map_err(status("CloseDataSource"))?
            .into_inner();

        Ok(DataSourceResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn create_llm(&self, name: &str, config: &LlmConfig) -> Result<LlmResponse, Error> {
        let request = pb::CreateLlmRequest {
            name: name.to_string(),
            config: Some(convert::llm_config(config)),
        };
        let reply = self
            .stub
            .clone()
            .create_llm(request)
            .await
            .map_err(status("CreateLLM"))?
            .into_inner();

        Ok(LlmResponse::new(reply.success, non_empty(reply.error)))
    }

    async fn generate_llm(&self, name: &str, prompt: &str) -> Result<LlmGenerateResponse, Error> {
        let request = pb::GenerateLlmRequest {
            name: name.to_string(),
            prompt: prompt.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .generate_llm(request)
            .await
            .map_err(status("GenerateLLM"))?
            .into_inner();

        Ok(LlmGenerateResponse::new(
            reply.success,
            reply.text,
            non_empty(reply.error),
        ))
    }

    async fn chat_llm(
        &self,
        name: &str,
        messages: &[ChatMessage],
    ) -> Result<LlmChatResponse, Error> {
        let request = pb::ChatLlmRequest {
            name: name.to_string(),
            messages: convert::chat_messages(messages),
        };
        let reply = self
            .stub
            .clone()
            .chat_llm(request)
            .await
            .map_err(status("ChatLLM"))?
            .into_inner();

        Ok(LlmChatResponse::new(
            reply.success,
            reply.text,
            non_empty(reply.error),
        ))
    }

    async fn embedding_llm(&self, name: &str, text: &str) -> Result<LlmEmbeddingResponse, Error> {
        let request = pb::EmbeddingLlmRequest {
            name: name.to_string(),
            text: text.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .embedding_llm(request)
            .await
            .map_err(status("EmbeddingLLM"))?
            .into_inner();

        Ok(LlmEmbeddingResponse::new(
            reply.success,
            reply.embedding.into_iter().map(f64::from).collect(),
            non_empty(reply.error),
        ))
    }

    async fn ping_llm(&self, name: &str) -> Result<LlmResponse, Error> {
        let request = pb::PingLlmRequest {
            name: name.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .ping_llm(request)
            .await
            .map_err(status("PingLLM"))?
            .into_inner();

        Ok(LlmResponse::new(
            is_healthy(reply.healthy, reply.success),
            non_empty(reply.error),
        ))
    }

    async fn close_llm(&self, name: &str) -> Result<LlmResponse, Error> {
        let request = pb::CloseLlmRequest {
            name: name.to_string(),
        };
        let reply = self
            .stub
            .clone()
            .close_llm(request)
            .await
            .map_err(status("CloseLLM"))?
            .into_inner();

        Ok(LlmResponse::new(reply.success, non_empty(reply.error)))
    }
}
