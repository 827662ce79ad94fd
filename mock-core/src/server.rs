use crate::{
    MockCore,
    pb::{self, oper_router_server::OperRouter},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tonic::{Request, Response, Status};

/// gRPC front of a [`MockCore`].
///
/// Requests are translated to the JSON-RPC shape, answered by the core, and the
/// replies translated back, so every transport observes the same state machine.
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    core: Arc<Mutex<MockCore>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves an existing core, shared with other fronts.
    pub fn with_core(core: Arc<Mutex<MockCore>>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> Arc<Mutex<MockCore>> {
        Arc::clone(&self.core)
    }

    pub fn into_service(self) -> pb::oper_router_server::OperRouterServer<Self> {
        pb::oper_router_server::OperRouterServer::new(self)
    }

    fn call(&self, method: &str, params: Value) -> Result<Reply, Status> {
        let mut core = self
            .core
            .lock()
            .map_err(|_| Status::internal("mock core lock poisoned"))?;

        core.dispatch(method, &params)
            .map(Reply)
            .ok_or_else(|| Status::unimplemented(method.to_string()))
    }
}

struct Reply(Value);

impl Reply {
    fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn success(&self) -> bool {
        self.flag("success")
    }

    fn string(&self, key: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn error(&self) -> String {
        self.string("error")
    }
}

fn driver_name(code: i32) -> &'static str {
    match pb::DatasourceType::try_from(code) {
        Ok(pb::DatasourceType::Postgres) => "postgres",
        Ok(pb::DatasourceType::Mysql) => "mysql",
        Ok(pb::DatasourceType::Redis) => "redis",
        Ok(pb::DatasourceType::Mongodb) => "mongodb",
        Ok(pb::DatasourceType::Kafka) => "kafka",
        _ => "",
    }
}

fn provider_name(code: i32) -> &'static str {
    match pb::LlmProvider::try_from(code) {
        Ok(pb::LlmProvider::Openai) => "openai",
        Ok(pb::LlmProvider::Ollama) => "ollama",
        Ok(pb::LlmProvider::Anthropic) => "anthropic",
        Ok(pb::LlmProvider::Local) => "local",
        _ => "",
    }
}

fn role_name(code: i32) -> &'static str {
    match pb::MessageRole::try_from(code) {
        Ok(pb::MessageRole::System) => "system",
        Ok(pb::MessageRole::User) => "user",
        Ok(pb::MessageRole::Assistant) => "assistant",
        _ => "",
    }
}

fn value_to_json(value: pb::Value) -> Value {
    use pb::value::Kind;

    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => json!(b),
        Some(Kind::IntValue(i)) => json!(i),
        Some(Kind::FloatValue(f)) => json!(f),
        Some(Kind::StringValue(s)) => json!(s),
        Some(Kind::BytesValue(b)) => json!(b),
    }
}

fn json_to_value(value: &Value) -> pb::Value {
    use pb::value::Kind;

    let kind = match value {
        Value::Null => Kind::NullValue(pb::NullValue::NullValue.into()),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntValue(i),
            None => Kind::FloatValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => match bytes_of(items) {
            Some(bytes) => Kind::BytesValue(bytes),
            None => Kind::StringValue(value.to_string()),
        },
        Value::Object(_) => Kind::StringValue(value.to_string()),
    };

    pb::Value { kind: Some(kind) }
}

fn bytes_of(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn row_to_json(row: pb::Row) -> Value {
    Value::Object(
        row.columns
            .into_iter()
            .map(|(column, value)| (column, value_to_json(value)))
            .collect(),
    )
}

fn row_from_json(row: &Value) -> pb::Row {
    pb::Row {
        columns: row
            .as_object()
            .into_iter()
            .flatten()
            .map(|(column, value)| (column.clone(), json_to_value(value)))
            .collect(),
    }
}

#[tonic::async_trait]
impl OperRouter for MockServer {
    async fn ping(
        &self,
        _request: Request<pb::PingRequest>,
    ) -> Result<Response<pb::PingResponse>, Status> {
        let reply = self.call("ping", Value::Null)?;
        Ok(Response::new(pb::PingResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn validate_config(
        &self,
        request: Request<pb::ValidateConfigRequest>,
    ) -> Result<Response<pb::ValidateConfigResponse>, Status> {
        let config: Value = match serde_json::from_str(&request.into_inner().config) {
            Ok(config) => config,
            Err(e) => {
                return Ok(Response::new(pb::ValidateConfigResponse {
                    success: false,
                    error: format!("invalid configuration JSON: {e}"),
                }));
            }
        };

        let reply = self.call("validate_config", json!({ "config": config }))?;
        Ok(Response::new(pb::ValidateConfigResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn load_config(
        &self,
        request: Request<pb::LoadConfigRequest>,
    ) -> Result<Response<pb::LoadConfigResponse>, Status> {
        let reply = self.call("load_config", json!({ "path": request.into_inner().path }))?;
        Ok(Response::new(pb::LoadConfigResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn get_metadata(
        &self,
        _request: Request<pb::GetMetadataRequest>,
    ) -> Result<Response<pb::GetMetadataResponse>, Status> {
        let reply = self.call("get_metadata", json!({}))?;
        let metadata = Reply(reply.0["metadata"].clone());

        Ok(Response::new(pb::GetMetadataResponse {
            metadata: Some(pb::Metadata {
                name: metadata.string("name"),
                version: metadata.string("version"),
                description: Some(metadata.string("description")),
            }),
        }))
    }

    async fn create_data_source(
        &self,
        request: Request<pb::CreateDataSourceRequest>,
    ) -> Result<Response<pb::CreateDataSourceResponse>, Status> {
        let request = request.into_inner();
        let config = request.config.unwrap_or_default();
        let params = json!({
            "name": request.name,
            "config": { "driver": driver_name(config.r#type), "url": config.url },
        });

        let reply = self.call("datasource.create", params)?;
        Ok(Response::new(pb::CreateDataSourceResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn query_data_source(
        &self,
        request: Request<pb::QueryDataSourceRequest>,
    ) -> Result<Response<pb::QueryDataSourceResponse>, Status> {
        let request = request.into_inner();
        let params = json!({ "name": request.name, "query": request.query });

        let reply = self.call("datasource.query", params)?;
        let rows = reply.0["rows"]
            .as_array()
            .into_iter()
            .flatten()
            .map(row_from_json)
            .collect();

        Ok(Response::new(pb::QueryDataSourceResponse {
            success: reply.success(),
            rows,
            error: reply.error(),
        }))
    }

    async fn execute_data_source(
        &self,
        request: Request<pb::ExecuteDataSourceRequest>,
    ) -> Result<Response<pb::ExecuteDataSourceResponse>, Status> {
        let request = request.into_inner();
        let params = json!({ "name": request.name, "query": request.query });

        let reply = self.call("datasource.execute", params)?;
        Ok(Response::new(pb::ExecuteDataSourceResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn insert_data_source(
        &self,
        request: Request<pb::InsertDataSourceRequest>,
    ) -> Result<Response<pb::InsertDataSourceResponse>, Status> {
        let request = request.into_inner();
        let data = request.data.map(row_to_json).unwrap_or(json!({}));
        let params = json!({ "name": request.name, "data": data });

        let reply = self.call("datasource.insert", params)?;
        Ok(Response::new(pb::InsertDataSourceResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn ping_data_source(
        &self,
        request: Request<pb::PingDataSourceRequest>,
    ) -> Result<Response<pb::PingDataSourceResponse>, Status> {
        let reply = self.call("datasource.ping", json!({ "name": request.into_inner().name }))?;
        Ok(Response::new(pb::PingDataSourceResponse {
            healthy: reply.flag("healthy"),
            error: reply.error(),
            success: reply.success(),
        }))
    }

    async fn close_data_source(
        &self,
        request: Request<pb::CloseDataSourceRequest>,
    ) -> Result<Response<pb::CloseDataSourceResponse>, Status> {
        let reply = self.call("datasource.close", json!({ "name": request.into_inner().name }))?;
        Ok(Response::new(pb::CloseDataSourceResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn create_llm(
        &self,
        request: Request<pb::CreateLlmRequest>,
    ) -> Result<Response<pb::CreateLlmResponse>, Status> {
        let request = request.into_inner();
        let config = request.config.unwrap_or_default();
        let params = json!({
            "name": request.name,
            "config": {
                "provider": provider_name(config.provider),
                "model": config.model,
                "api_key": config.api_key,
            },
        });

        let reply = self.call("llm.create", params)?;
        Ok(Response::new(pb::CreateLlmResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }

    async fn generate_llm(
        &self,
        request: Request<pb::GenerateLlmRequest>,
    ) -> Result<Response<pb::GenerateLlmResponse>, Status> {
        let request = request.into_inner();
        let params = json!({ "name": request.name, "prompt": request.prompt });

        let reply = self.call("llm.generate", params)?;
        Ok(Response::new(pb::GenerateLlmResponse {
            success: reply.success(),
            text: reply.string("text"),
            error: reply.error(),
        }))
    }

    async fn chat_llm(
        &self,
        request: Request<pb::ChatLlmRequest>,
    ) -> Result<Response<pb::ChatLlmResponse>, Status> {
        let request = request.into_inner();
        let messages: Vec<_> = request
            .messages
            .into_iter()
            .map(|m| json!({ "role": role_name(m.role), "content": m.content }))
            .collect();
        let params = json!({ "name": request.name, "messages": messages });

        let reply = self.call("llm.chat", params)?;
        Ok(Response::new(pb::ChatLlmResponse {
            success: reply.success(),
            text: reply.string("text"),
            error: reply.error(),
        }))
    }

    async fn embedding_llm(
        &self,
        request: Request<pb::EmbeddingLlmRequest>,
    ) -> Result<Response<pb::EmbeddingLlmResponse>, Status> {
        let request = request.into_inner();
        let params = json!({ "name": request.name, "text": request.text });

        let reply = self.call("llm.embedding", params)?;
        let embedding = reply.0["embedding"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_f64)
            .map(|x| x as f32)
            .collect();

        Ok(Response::new(pb::EmbeddingLlmResponse {
            success: reply.success(),
            embedding,
            error: reply.error(),
        }))
    }

    async fn ping_llm(
        &self,
        request: Request<pb::PingLlmRequest>,
    ) -> Result<Response<pb::PingLlmResponse>, Status> {
        let reply = self.call("llm.ping", json!({ "name": request.into_inner().name }))?;
        Ok(Response::new(pb::PingLlmResponse {
            healthy: reply.flag("healthy"),
            error: reply.error(),
            success: reply.success(),
        }))
    }

    async fn close_llm(
        &self,
        request: Request<pb::CloseLlmRequest>,
    ) -> Result<Response<pb::CloseLlmResponse>, Status> {
        let reply = self.call("llm.close", json!({ "name": request.into_inner().name }))?;
        Ok(Response::new(pb::CloseLlmResponse {
            success: reply.success(),
            error: reply.error(),
        }))
    }
}
