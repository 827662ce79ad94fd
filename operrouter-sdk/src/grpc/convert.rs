//! # Record <-> Protobuf Conversions
//!
//! The gRPC schema encodes drivers, providers and chat roles as integer enums and
//! row values as a tagged union. This module holds the fixed lookup tables and the
//! conversions in both directions.
//!
//! Lookups are case insensitive. An unknown name maps to code `0` (`*_UNSPECIFIED`)
//! instead of failing, so the core decides how to reject it.
use super::pb;
use crate::client::{ChatMessage, DataSourceConfig, LlmConfig, Row, Value};

/// `(name, code)` pairs of the `DatasourceType` enum.
const DRIVERS: &[(&str, pb::DatasourceType)] = &[
    ("postgres", pb::DatasourceType::Postgres),
    ("mysql", pb::DatasourceType::Mysql),
    ("redis", pb::DatasourceType::Redis),
    ("mongodb", pb::DatasourceType::Mongodb),
    ("kafka", pb::DatasourceType::Kafka),
];

/// `(name, code)` pairs of the `LlmProvider` enum.
const PROVIDERS: &[(&str, pb::LlmProvider)] = &[
    ("openai", pb::LlmProvider::Openai),
    ("ollama", pb::LlmProvider::Ollama),
    ("anthropic", pb::LlmProvider::Anthropic),
    ("local", pb::LlmProvider::Local),
];

/// `(name, code)` pairs of the `MessageRole` enum.
const ROLES: &[(&str, pb::MessageRole)] = &[
    ("system", pb::MessageRole::System),
    ("user", pb::MessageRole::User),
    ("assistant", pb::MessageRole::Assistant),
];

fn code_of<E: Copy + Into<i32>>(table: &[(&str, E)], name: &str) -> i32 {
    table
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, code)| (*code).into())
        .unwrap_or(0)
}

fn name_of<E: Copy + Into<i32>>(table: &[(&'static str, E)], code: i32) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, known)| (*known).into() == code)
        .map(|(name, _)| *name)
}

/// Wire code of a data source driver (`postgres` -> 1 ... `kafka` -> 5, unknown -> 0).
pub fn driver_code(driver: &str) -> i32 {
    code_of(DRIVERS, driver)
}

/// Canonical driver name of a wire code, `None` for 0 and unknown codes.
pub fn driver_name(code: i32) -> Option<&'static str> {
    name_of(DRIVERS, code)
}

/// Wire code of an LLM provider (`openai` -> 1 ... `local` -> 4, unknown -> 0).
pub fn provider_code(provider: &str) -> i32 {
    code_of(PROVIDERS, provider)
}

/// Canonical provider name of a wire code, `None` for 0 and unknown codes.
pub fn provider_name(code: i32) -> Option<&'static str> {
    name_of(PROVIDERS, code)
}

/// Wire code of a chat role (`system` -> 1, `user` -> 2, `assistant` -> 3, unknown -> 0).
pub fn role_code(role: &str) -> i32 {
    code_of(ROLES, role)
}

/// Canonical role name of a wire code, `None` for 0 and unknown codes.
pub fn role_name(code: i32) -> Option<&'static str> {
    name_of(ROLES, code)
}

/// Connection URL the core expects for a data source.
///
/// Credentials are only embedded for the SQL drivers, and only when a username is set.
pub fn datasource_url(config: &DataSourceConfig) -> String {
    let scheme = match config.driver.to_ascii_lowercase().as_str() {
        "postgres" => "postgresql",
        "mysql" => "mysql",
        _ => {
            return format!("{}://{}:{}", config.driver, config.host, config.port);
        }
    };

    let credentials = match (&config.username, &config.password) {
        (Some(user), Some(password)) => format!("{user}:{password}@"),
        (Some(user), None) => format!("{user}@"),
        (None, _) => String::new(),
    };

    format!(
        "{scheme}://{credentials}{}:{}/{}",
        config.host, config.port, config.database
    )
}

pub fn datasource_config(config: &DataSourceConfig) -> pb::DataSourceConfig {
    pb::DataSourceConfig {
        r#type: driver_code(&config.driver),
        url: datasource_url(config),
    }
}

pub fn llm_config(config: &LlmConfig) -> pb::LlmConfig {
    pb::LlmConfig {
        provider: provider_code(&config.provider),
        model: config.model.clone(),
        api_key: config.api_key.clone().unwrap_or_default(),
    }
}

pub fn chat_messages(messages: &[ChatMessage]) -> Vec<pb::Message> {
    messages
        .iter()
        .map(|message| pb::Message {
            role: role_code(message.role.as_str()),
            content: message.content.clone(),
        })
        .collect()
}

impl From<&Value> for pb::Value {
    fn from(value: &Value) -> Self {
        use pb::value::Kind;

        let kind = match value {
            Value::Null => Kind::NullValue(pb::NullValue::NullValue.into()),
            Value::Bool(b) => Kind::BoolValue(*b),
            Value::Int(i) => Kind::IntValue(*i),
            Value::Float(f) => Kind::FloatValue(*f),
            Value::String(s) => Kind::StringValue(s.clone()),
            Value::Bytes(b) => Kind::BytesValue(b.clone()),
        };

        pb::Value { kind: Some(kind) }
    }
}

impl From<pb::Value> for Value {
    fn from(value: pb::Value) -> Self {
        use pb::value::Kind;

        match value.kind {
            None | Some(Kind::NullValue(_)) => Value::Null,
            Some(Kind::BoolValue(b)) => Value::Bool(b),
            Some(Kind::IntValue(i)) => Value::Int(i),
            Some(Kind::FloatValue(f)) => Value::Float(f),
            Some(Kind::StringValue(s)) => Value::String(s),
            Some(Kind::BytesValue(b)) => Value::Bytes(b),
        }
    }
}

pub fn row_to_proto(row: &Row) -> pb::Row {
    pb::Row {
        columns: row
            .iter()
            .map(|(column, value)| (column.clone(), pb::Value::from(value)))
            .collect(),
    }
}

pub fn row_from_proto(row: pb::Row) -> Row {
    row.columns
        .into_iter()
        .map(|(column, value)| (column, Value::from(value)))
        .collect()
}
