use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const NAME: &str = "operrouter-core";
pub const VERSION: &str = "0.1.0";

pub const DRIVERS: &[&str] = &["postgres", "mysql", "redis", "mongodb", "kafka"];
pub const PROVIDERS: &[&str] = &["openai", "ollama", "anthropic", "local"];

const EMBEDDING_DIMENSIONS: usize = 8;

type Outcome = Result<Value, String>;

#[derive(Debug)]
struct DataSource {
    rows: Vec<Map<String, Value>>,
}

#[derive(Debug)]
struct Llm {
    model: String,
}

/// In-memory core: named data sources holding rows, and named LLM stubs.
#[derive(Debug, Default)]
pub struct MockCore {
    datasources: BTreeMap<String, DataSource>,
    llms: BTreeMap<String, Llm>,
    loaded_config: Option<String>,
}

impl MockCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasource_names(&self) -> Vec<&str> {
        self.datasources.keys().map(String::as_str).collect()
    }

    pub fn llm_names(&self) -> Vec<&str> {
        self.llms.keys().map(String::as_str).collect()
    }

    pub fn rows(&self, datasource: &str) -> Option<&[Map<String, Value>]> {
        self.datasources.get(datasource).map(|ds| ds.rows.as_slice())
    }

    /// Path of the last configuration file loaded successfully.
    pub fn loaded_config(&self) -> Option<&str> {
        self.loaded_config.as_deref()
    }

    /// Answers a call by JSON-RPC method name.
    ///
    /// Returns the JSON reply object, or `None` when the method is unknown.
    /// Business failures are replies with `"success": false` and an `error` message.
    pub fn dispatch(&mut self, method: &str, params: &Value) -> Option<Value> {
        let outcome = match method {
            "ping" => Ok(json!({ "success": true })),
            "validate_config" => validate_config(params.get("config")),
            "load_config" => self.load_config(params),
            "get_metadata" => Ok(json!({
                "metadata": {
                    "name": NAME,
                    "version": VERSION,
                    "description": "In-memory OperRouter core",
                }
            })),
            "datasource.create" => self.create_datasource(params),
            "datasource.query" => self.query_datasource(params),
            "datasource.execute" => self.execute_datasource(params),
            "datasource.insert" => self.insert_datasource(params),
            "datasource.ping" => return Some(self.ping_datasource(params)),
            "datasource.close" => self.close_datasource(params),
            "llm.create" => self.create_llm(params),
            "llm.generate" => self.generate_llm(params),
            "llm.chat" => self.chat_llm(params),
            "llm.embedding" => self.embedding_llm(params),
            "llm.ping" => self.ping_llm(params),
            "llm.close" => self.close_llm(params),
            _ => return None,
        };

        Some(outcome.unwrap_or_else(|error| json!({ "success": false, "error": error })))
    }

    fn load_config(&mut self, params: &Value) -> Outcome {
        let path = str_param(params, "path")?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{path}': {e}"))?;

        if content.trim().is_empty() {
            return Err(format!("configuration file '{path}' is empty"));
        }

        self.loaded_config = Some(path.to_string());
        Ok(json!({ "success": true, "message": format!("loaded {path}") }))
    }

    fn create_datasource(&mut self, params: &Value) -> Outcome {
        let name = str_param(params, "name")?;
        let driver = params
            .get("config")
            .and_then(|c| c.get("driver"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        if !DRIVERS.contains(&driver.to_ascii_lowercase().as_str()) {
            return Err(format!("unsupported driver '{driver}'"));
        }
        if self.datasources.contains_key(name) {
            return Err(format!("datasource '{name}' already exists"));
        }

        self.datasources
            .insert(name.to_string(), DataSource { rows: Vec::new() });
        Ok(success())
    }

    fn datasource(&mut self, params: &Value) -> Result<&mut DataSource, String> {
        let name = str_param(params, "name")?;
        self.datasources
            .get_mut(name)
            .ok_or_else(|| format!("datasource '{name}' not found"))
    }

    fn query_datasource(&mut self, params: &Value) -> Outcome {
        let query = str_param(params, "query")?;
        let ds = self.datasource(params)?;

        let limit = limit_of(query).unwrap_or(ds.rows.len());
        let rows: Vec<_> = ds.rows.iter().take(limit).cloned().collect();

        Ok(json!({ "success": true, "rows": rows }))
    }

    fn execute_datasource(&mut self, params: &Value) -> Outcome {
        let query = str_param(params, "query")?.trim();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let ds = self.datasource(params)?;
        let is_delete = query
            .get(..6)
            .is_some_and(|verb| verb.eq_ignore_ascii_case("delete"));
        if is_delete {
            ds.rows.clear();
        }

        Ok(success())
    }

    fn insert_datasource(&mut self, params: &Value) -> Outcome {
        let row = params
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .ok_or("missing parameter 'data'")?;

        self.datasource(params)?.rows.push(row);
        Ok(success())
    }

    /// Reports through `healthy` only, without a `success` flag.
    fn ping_datasource(&mut self, params: &Value) -> Value {
        match self.datasource(params) {
            Ok(_) => json!({ "healthy": true }),
            Err(error) => json!({ "healthy": false, "error": error }),
        }
    }

    fn close_datasource(&mut self, params: &Value) -> Outcome {
        let name = str_param(params, "name")?;
        self.datasources
            .remove(name)
            .map(|_| success())
            .ok_or_else(|| format!("datasource '{name}' not found"))
    }

    fn create_llm(&mut self, params: &Value) -> Outcome {
        let name = str_param(params, "name")?;
        let config = params.get("config").cloned().unwrap_or_default();
        let provider = str_param(&config, "provider").unwrap_or_default();
        let model = str_param(&config, "model").unwrap_or_default();

        if !PROVIDERS.contains(&provider.to_ascii_lowercase().as_str()) {
            return Err(format!("unsupported provider '{provider}'"));
        }
        if model.is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.llms.contains_key(name) {
            return Err(format!("llm '{name}' already exists"));
        }

        self.llms.insert(
            name.to_string(),
            Llm {
                model: model.to_string(),
            },
        );
        Ok(success())
    }

    fn llm(&self, params: &Value) -> Result<&Llm, String> {
        let name = str_param(params, "name")?;
        self.llms
            .get(name)
            .ok_or_else(|| format!("llm '{name}' not found"))
    }

    fn generate_llm(&mut self, params: &Value) -> Outcome {
        let prompt = str_param(params, "prompt")?;
        let llm = self.llm(params)?;

        Ok(json!({ "success": true, "text": format!("[{}] {prompt}", llm.model) }))
    }

    fn chat_llm(&mut self, params: &Value) -> Outcome {
        let llm = self.llm(params)?;
        let question = params
            .get("messages")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|m| m.get("role").and_then(Value::as_str) == Some("user"))
            .filter_map(|m| m.get("content").and_then(Value::as_str))
            .next_back()
            .ok_or("no user message")?;

        Ok(json!({
            "success": true,
            "text": format!("[{}] reply to: {question}", llm.model),
        }))
    }

    fn embedding_llm(&mut self, params: &Value) -> Outcome {
        let text = str_param(params, "text")?;
        self.llm(params)?;

        Ok(json!({ "success": true, "embedding": embedding(text) }))
    }

    /// Reports through `success` only, without a `healthy` flag.
    fn ping_llm(&mut self, params: &Value) -> Outcome {
        self.llm(params).map(|_| success())
    }

    fn close_llm(&mut self, params: &Value) -> Outcome {
        let name = str_param(params, "name")?;
        self.llms
            .remove(name)
            .map(|_| success())
            .ok_or_else(|| format!("llm '{name}' not found"))
    }
}

fn success() -> Value {
    json!({ "success": true })
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing parameter '{key}'"))
}

fn validate_config(config: Option<&Value>) -> Outcome {
    let config = config
        .and_then(Value::as_object)
        .ok_or("configuration must be a JSON object")?;

    let named = config
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !named {
        return Err("missing required field 'name'".to_string());
    }

    Ok(json!({ "success": true, "message": "configuration is valid" }))
}

/// Row limit of a trailing `LIMIT n` clause.
fn limit_of(query: &str) -> Option<usize> {
    let mut tokens = query.split_whitespace();
    tokens.by_ref().find(|t| t.eq_ignore_ascii_case("limit"))?;
    tokens.next()?.trim_end_matches(';').parse().ok()
}

/// Deterministic embedding of `text`: byte sums folded into a fixed number of buckets.
pub fn embedding(text: &str) -> Vec<f64> {
    let mut buckets = [0u32; EMBEDDING_DIMENSIONS];
    for (i, byte) in text.bytes().enumerate() {
        buckets[i % EMBEDDING_DIMENSIONS] += u32::from(byte);
    }
    buckets
        .iter()
        .map(|sum| f64::from(sum % 1000) / 1000.0)
        .collect()
}
