use super::value::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Configs ====================

/// Connection settings of a data source to be created on the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// One of `postgres`, `mysql`, `redis`, `mongodb`, `kafka`.
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl DataSourceConfig {
    pub fn new(
        driver: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        Self {
            driver: driver.into(),
            host: host.into(),
            port,
            database: database.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Settings of an LLM instance to be created on the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// One of `openai`, `ollama`, `anthropic`, `local`.
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl LlmConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

// ==================== Chat ====================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!(
                "unknown chat role '{other}', expected system, user or assistant"
            )),
        }
    }
}

/// A single turn of a conversation. Conversations are sent in slice order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ==================== Metadata ====================

/// Static description of the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ==================== Responses ====================

/// Returns `Some(message)` for a non-empty message.
pub(crate) fn non_empty(message: impl Into<String>) -> Option<String> {
    Some(message.into()).filter(|m| !m.is_empty())
}

/// Response records that only carry the outcome of the call.
macro_rules! status_response {
    ($(#[$doc:meta] $name:ident),+ $(,)?) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $name {
                pub success: bool,
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub message: Option<String>,
            }

            impl $name {
                pub fn new(success: bool, message: Option<String>) -> Self {
                    Self { success, message }
                }
            }
        )+
    };
}

status_response! {
    /// Outcome of [`ping`](super::OperRouterClient::ping).
    PingResponse,
    /// Outcome of config validation or loading.
    ConfigResponse,
    /// Outcome of a data source operation without a payload.
    DataSourceResponse,
    /// Outcome of an LLM operation without a payload.
    LlmResponse,
}

/// Rows returned by [`query_datasource`](super::OperRouterClient::query_datasource).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSourceQueryResponse {
    pub success: bool,
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DataSourceQueryResponse {
    /// Builds the record. Rows are dropped when `success` is false.
    pub fn new(success: bool, rows: Vec<Row>, message: Option<String>) -> Self {
        Self {
            success,
            rows: if success { rows } else { Vec::new() },
            message,
        }
    }
}

/// Text produced by [`generate_llm`](super::OperRouterClient::generate_llm).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmGenerateResponse {
    pub success: bool,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LlmGenerateResponse {
    /// Builds the record. Text is dropped when `success` is false.
    pub fn new(success: bool, text: String, message: Option<String>) -> Self {
        Self {
            success,
            text: if success { text } else { String::new() },
            message,
        }
    }
}

/// Reply produced by [`chat_llm`](super::OperRouterClient::chat_llm).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmChatResponse {
    pub success: bool,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LlmChatResponse {
    /// Builds the record. Text is dropped when `success` is false.
    pub fn new(success: bool, text: String, message: Option<String>) -> Self {
        Self {
            success,
            text: if success { text } else { String::new() },
            message,
        }
    }
}

/// Vector produced by [`embedding_llm`](super::OperRouterClient::embedding_llm).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmEmbeddingResponse {
    pub success: bool,
    pub embedding: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LlmEmbeddingResponse {
    /// Builds the record. The vector is dropped when `success` is false.
    pub fn new(success: bool, embedding: Vec<f64>, message: Option<String>) -> Self {
        Self {
            success,
            embedding: if success { embedding } else { Vec::new() },
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Value;

    #[test]
    fn failed_records_never_carry_payloads() {
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(1));

        let query = DataSourceQueryResponse::new(false, vec![row], Some("boom".into()));
        assert!(query.rows.is_empty());
        assert_eq!(query.message.as_deref(), Some("boom"));

        let generate = LlmGenerateResponse::new(false, "partial".into(), None);
        assert!(generate.text.is_empty());

        let chat = LlmChatResponse::new(false, "partial".into(), None);
        assert!(chat.text.is_empty());

        let embedding = LlmEmbeddingResponse::new(false, vec![0.1, 0.2], None);
        assert!(embedding.embedding.is_empty());
    }

    #[test]
    fn successful_records_keep_payloads() {
        let generate = LlmGenerateResponse::new(true, "hello".into(), None);
        assert_eq!(generate.text, "hello");

        let embedding = LlmEmbeddingResponse::new(true, vec![0.5], None);
        assert_eq!(embedding.embedding, vec![0.5]);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = ChatMessage::assistant("hi");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({"role": "assistant", "content": "hi"})
        );
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn credentials_are_omitted_when_absent() {
        let config = DataSourceConfig::new("postgres", "localhost", 5432, "testdb");
        let json = serde_json::to_value(&config).unwrap();

        assert!(json.get("username").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["port"], 5432);
    }

    #[test]
    fn empty_messages_are_absent() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("oops"), Some("oops".to_string()));
    }
}
