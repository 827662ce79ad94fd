//! # CLI
//!
//! This module defines the command-line interface of `operrouter` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring rows
//! are JSON objects and chat messages are `role:content`). Connection flags are global so
//! they can be given before or after the subcommand, and fall back to environment variables.
use clap::{Parser, Subcommand, ValueEnum};
use operrouter_sdk::{ChatMessage, Row, TransportConfig};
use std::path::PathBuf;

pub const DEFAULT_HTTP_URL: &str = "http://localhost:8080";
pub const DEFAULT_GRPC_URL: &str = "http://localhost:50051";

#[derive(Parser)]
#[command(name = "operrouter", version, about = "OperRouter command line client")]
pub struct Cli {
    /// Transport used to reach the core
    #[arg(
        long,
        value_enum,
        env = "OPERROUTER_TRANSPORT",
        default_value_t = Transport::Http,
        global = true
    )]
    pub transport: Transport,

    /// Server URL: the HTTP base URL or the gRPC address
    #[arg(long, env = "OPERROUTER_URL", global = true)]
    pub url: Option<String>,

    /// Request timeout in seconds (HTTP only)
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Path to the native core library (FFI only)
    #[arg(long, env = "OPERROUTER_FFI_PATH", global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Http,
    Grpc,
    Ffi,
}

impl Cli {
    /// The transport selected by the flags, with defaults filled in.
    pub fn transport_config(&self) -> TransportConfig {
        match self.transport {
            Transport::Http => TransportConfig::Http {
                base_url: self.url.clone().unwrap_or_else(|| DEFAULT_HTTP_URL.into()),
                timeout_secs: self.timeout,
            },
            Transport::Grpc => TransportConfig::Grpc {
                address: self.url.clone().unwrap_or_else(|| DEFAULT_GRPC_URL.into()),
            },
            Transport::Ffi => TransportConfig::Ffi {
                library_path: self.library.clone(),
            },
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the core is reachable
    Ping,

    /// Validate an operator configuration
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// operrouter validate-config '{"name": "orders", "version": "1.0"}'
    /// ```
    ValidateConfig {
        /// Configuration as a JSON object
        #[arg(value_parser = parse_json)]
        config: serde_json::Value,
    },

    /// Load a configuration file from a path the core can read
    LoadConfig { path: String },

    /// Show the core metadata
    Metadata,

    /// Manage data sources
    Datasource {
        #[command(subcommand)]
        sub: DatasourceCommands,
    },

    /// Manage LLM instances
    Llm {
        #[command(subcommand)]
        sub: LlmCommands,
    },
}

#[derive(Subcommand)]
pub enum DatasourceCommands {
    /// Create a data source connection
    Create {
        name: String,
        /// Driver (postgres, mysql, redis, mongodb, kafka)
        #[arg(long)]
        driver: String,
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long)]
        database: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Run a read query and print the rows
    Query { name: String, query: String },
    /// Run a write or DDL statement
    Execute { name: String, query: String },
    /// Insert one row
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// operrouter datasource insert main '{"name": "Test User", "age": 30}'
    /// ```
    Insert {
        name: String,
        /// Row as a JSON object
        #[arg(value_parser = parse_row)]
        row: Row,
    },
    /// Check the health of a data source
    Ping { name: String },
    /// Close a data source connection
    Close { name: String },
}

#[derive(Subcommand)]
pub enum LlmCommands {
    /// Create an LLM instance
    Create {
        name: String,
        /// Provider (openai, ollama, anthropic, local)
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Generate a completion for a prompt
    Generate { name: String, prompt: String },
    /// Send a conversation
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// operrouter llm chat writer -m 'system:Be terse' -m 'user:What is Rust?'
    /// ```
    Chat {
        name: String,
        /// Message as `role:content`, repeatable, sent in order
        #[arg(short = 'm', long = "message", value_parser = parse_message, required = true)]
        messages: Vec<ChatMessage>,
    },
    /// Compute an embedding vector
    Embedding { name: String, text: String },
    /// Check the health of an LLM instance
    Ping { name: String },
    /// Close an LLM instance
    Close { name: String },
}

fn parse_json(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}

fn parse_row(value: &str) -> Result<Row, String> {
    match parse_json(value)? {
        serde_json::Value::Object(columns) => Ok(columns
            .into_iter()
            .map(|(column, value)| (column, value.into()))
            .collect()),
        _ => Err("A row must be a JSON object".to_string()),
    }
}

fn parse_message(value: &str) -> Result<ChatMessage, String> {
    let (role, content) = value
        .split_once(':')
        .ok_or_else(|| format!("Invalid message format: '{value}'. Expected 'role:content'"))?;

    Ok(ChatMessage::new(role.trim().parse()?, content.trim()))
}
