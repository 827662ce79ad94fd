//! Runs a parsed command against any transport.
use crate::cli::{Commands, DatasourceCommands, LlmCommands};
use operrouter_sdk::{DataSourceConfig, LlmConfig, OperRouterClient};
use serde::Serialize;

/// A response record ready to print.
#[derive(Debug)]
pub struct Outcome {
    pub success: bool,
    pub body: serde_json::Value,
}

impl Outcome {
    fn of<T: Serialize>(success: bool, record: &T) -> anyhow::Result<Self> {
        Ok(Self {
            success,
            body: serde_json::to_value(record)?,
        })
    }
}

macro_rules! record {
    ($call:expr) => {{
        let record = $call.await?;
        Outcome::of(record.success, &record)
    }};
}

pub async fn run(client: &dyn OperRouterClient, command: Commands) -> anyhow::Result<Outcome> {
    match command {
        Commands::Ping => record!(client.ping()),
        Commands::ValidateConfig { config } => record!(client.validate_config(&config)),
        Commands::LoadConfig { path } => record!(client.load_config(&path)),
        Commands::Metadata => Outcome::of(true, &client.get_metadata().await?),
        Commands::Datasource { sub } => run_datasource(client, sub).await,
        Commands::Llm { sub } => run_llm(client, sub).await,
    }
}

async fn run_datasource(
    client: &dyn OperRouterClient,
    command: DatasourceCommands,
) -> anyhow::Result<Outcome> {
    match command {
        DatasourceCommands::Create {
            name,
            driver,
            host,
            port,
            database,
            username,
            password,
        } => {
            let config = DataSourceConfig {
                driver,
                host,
                port,
                database,
                username,
                password,
            };
            record!(client.create_datasource(&name, &config))
        }
        DatasourceCommands::Query { name, query } => {
            record!(client.query_datasource(&name, &query))
        }
        DatasourceCommands::Execute { name, query } => {
            record!(client.execute_datasource(&name, &query))
        }
        DatasourceCommands::Insert { name, row } => {
            record!(client.insert_datasource(&name, &row))
        }
        DatasourceCommands::Ping { name } => record!(client.ping_datasource(&name)),
        DatasourceCommands::Close { name } => record!(client.close_datasource(&name)),
    }
}

async fn run_llm(client: &dyn OperRouterClient, command: LlmCommands) -> anyhow::Result<Outcome> {
    match command {
        LlmCommands::Create {
            name,
            provider,
            model,
            api_key,
        } => {
            let config = LlmConfig {
                provider,
                model,
                api_key,
            };
            record!(client.create_llm(&name, &config))
        }
        LlmCommands::Generate { name, prompt } => record!(client.generate_llm(&name, &prompt)),
        LlmCommands::Chat { name, messages } => record!(client.chat_llm(&name, &messages)),
        LlmCommands::Embedding { name, text } => record!(client.embedding_llm(&name, &text)),
        LlmCommands::Ping { name } => record!(client.ping_llm(&name)),
        LlmCommands::Close { name } => record!(client.close_llm(&name)),
    }
}
