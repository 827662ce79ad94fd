//! JSON request and reply shapes shared by the HTTP and FFI transports.
//!
//! Both transports receive the same JSON object from the core: a `success` flag,
//! an optional `error` or `message`, and the payload of the operation.
use crate::client::{
    ChatMessage, ConfigResponse, DataSourceConfig, DataSourceQueryResponse, DataSourceResponse,
    LlmChatResponse, LlmConfig, LlmEmbeddingResponse, LlmGenerateResponse, LlmResponse, Metadata,
    PingResponse, Row, is_healthy, non_empty,
};
use serde::{Deserialize, Serialize};

/// A decoded reply of the core. Every field is optional on the wire, `null` included.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CoreReply {
    success: Option<bool>,
    healthy: Option<bool>,
    error: Option<String>,
    message: Option<String>,
    text: Option<String>,
    rows: Option<Vec<Row>>,
    embedding: Option<Vec<f64>>,
    metadata: Option<Metadata>,
}

impl CoreReply {
    fn success(&self) -> bool {
        self.success.unwrap_or(false)
    }

    /// `error` wins over `message`; empty strings count as absent.
    fn message(&mut self) -> Option<String> {
        self.error
            .take()
            .and_then(non_empty)
            .or_else(|| self.message.take().and_then(non_empty))
    }

    pub(crate) fn into_ping(mut self) -> PingResponse {
        PingResponse::new(self.success(), self.message())
    }

    pub(crate) fn into_config(mut self) -> ConfigResponse {
        ConfigResponse::new(self.success(), self.message())
    }

    pub(crate) fn into_metadata(self) -> Metadata {
        self.metadata.unwrap_or_default()
    }

    pub(crate) fn into_datasource(mut self) -> DataSourceResponse {
        DataSourceResponse::new(self.success(), self.message())
    }

    pub(crate) fn into_datasource_health(mut self) -> DataSourceResponse {
        let healthy = is_healthy(self.healthy.unwrap_or(false), self.success());
        DataSourceResponse::new(healthy, self.message())
    }

    pub(crate) fn into_query(mut self) -> DataSourceQueryResponse {
        let message = self.message();
        DataSourceQueryResponse::new(self.success(), self.rows.unwrap_or_default(), message)
    }

    pub(crate) fn into_llm(mut self) -> LlmResponse {
        LlmResponse::new(self.success(), self.message())
    }

    pub(crate) fn into_llm_health(mut self) -> LlmResponse {
        let healthy = is_healthy(self.healthy.unwrap_or(false), self.success());
        LlmResponse::new(healthy, self.message())
    }

    pub(crate) fn into_generate(mut self) -> LlmGenerateResponse {
        let message = self.message();
        LlmGenerateResponse::new(self.success(), self.text.unwrap_or_default(), message)
    }

    pub(crate) fn into_chat(mut self) -> LlmChatResponse {
        let message = self.message();
        LlmChatResponse::new(self.success(), self.text.unwrap_or_default(), message)
    }

    pub(crate) fn into_embedding(mut self) -> LlmEmbeddingResponse {
        let message = self.message();
        LlmEmbeddingResponse::new(self.success(), self.embedding.unwrap_or_default(), message)
    }
}

// ==================== Request params ====================

#[derive(Debug, Serialize)]
pub(crate) struct NameParams<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDataSourceParams<'a> {
    pub name: &'a str,
    pub config: &'a DataSourceConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryParams<'a> {
    pub name: &'a str,
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct InsertParams<'a> {
    pub name: &'a str,
    pub data: &'a Row,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateLlmParams<'a> {
    pub name: &'a str,
    pub config: &'a LlmConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct PromptParams<'a> {
    pub name: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatParams<'a> {
    pub name: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Serialize)]
pub(crate) struct TextParams<'a> {
    pub name: &'a str,
    pub text: &'a str,
}
