use operrouter_sdk::{
    ChatMessage, DataSourceConfig, Error, HttpClient, HttpClientConfig, LlmConfig,
    OperRouterClient, Row, Value, http::HttpError,
};
use serde_json::json;
use std::{io::Write, time::Duration};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};


async fn server_replying(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_ping_sends_jsonrpc_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "method": "ping",
            "params": {},
            "id": 1,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "result": {"success": true}, "id": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(server.uri()).unwrap();
    let pong = client.ping().await.unwrap();

    assert!(pong.success);
    assert_eq!(pong.message, None);
}

#[tokio::test]
async fn test_request_ids_increase() {
    let (server, _core) = core_responder::start().await;
    let client = HttpClient::new(format!("{}/", server.uri())).unwrap();

    client.ping().await.unwrap();
    client.get_metadata().await.unwrap();
    client.ping().await.unwrap();

    let ids: Vec<u64> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap()["id"].as_u64().unwrap())
        .collect();

    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_non_2xx_is_a_transport_error() {
    let server = server_replying(ResponseTemplate::new(500).set_body_string("boom")).await;
    let client = HttpClient::new(server.uri()).unwrap();

    let err = client.ping().await.unwrap_err();

    match err {
        Error::Http(HttpError::Status { method, status, body }) => {
            assert_eq!(method, "ping");
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rpc_error_member_is_a_transport_error() {
    let server = server_replying(ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": {"code": -32601, "message": "Method not found", "data": {"hint": "typo"}},
        "id": 1,
    })))
    .await;
    let client = HttpClient::new(server.uri()).unwrap();

    let err = client.get_metadata().await.unwrap_err();

    match err {
        Error::Http(HttpError::Rpc { method, code, message, data }) => {
            assert_eq!(method, "get_metadata");
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
            assert_eq!(data, Some(json!({"hint": "typo"})));
        }
        other => panic!("expected an RPC error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_null_error_member_is_ignored() {
    let server = server_replying(ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": {"success": true},
        "error": null,
        "id": 1,
    })))
    .await;
    let client = HttpClient::new(server.uri()).unwrap();

    assert!(client.ping().await.unwrap().success);
}

#[tokio::test]
async fn test_missing_result_decodes_as_failure() {
    let server =
        server_replying(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1})))
            .await;
    let client = HttpClient::new(server.uri()).unwrap();

    let pong = client.ping().await.unwrap();

    assert!(!pong.success);
    assert_eq!(pong.message, None);
}

#[tokio::test]
async fn test_invalid_body_is_a_decode_error() {
    let server = server_replying(ResponseTemplate::new(200).set_body_string("<html>")).await;
    let client = HttpClient::new(server.uri()).unwrap();

    let err = client.ping().await.unwrap_err();

    assert!(matches!(err, Error::Http(HttpError::Decode { .. })));
}

#[tokio::test]
async fn test_unreachable_server_is_a_request_error() {
    let client = HttpClient::new("http://127.0.0.1:1").unwrap();

    let err = client.ping().await.unwrap_err();

    assert!(matches!(err, Error::Http(HttpError::Request { .. })));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = server_replying(
        ResponseTemplate::new(200)
            .set_body_json(json!({"jsonrpc": "2.0", "result": {"success": true}, "id": 1}))
            .set_delay(Duration::from_secs(2)),
    )
    .await;
    let config = HttpClientConfig::new(server.uri()).with_timeout(Duration::from_millis(200));
    let client = HttpClient::with_config(config).unwrap();

    let err = client.ping().await.unwrap_err();

    match err {
        Error::Http(HttpError::Request { source, .. }) => assert!(source.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_business_failure_is_not_an_error() {
    let (server, _core) = core_responder::start().await;
    let client = HttpClient::new(server.uri()).unwrap();

    let result = client
        .query_datasource("missing", "SELECT 1")
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.rows.is_empty());
    assert_eq!(result.message.as_deref(), Some("datasource 'missing' not found"));
}

#[tokio::test]
async fn test_config_operations() {
    let (server, core) = core_responder::start().await;
    let client = HttpClient::new(server.uri()).unwrap();

    let valid = client
        .validate_config(&json!({"name": "orders", "version": "1.0"}))
        .await
        .unwrap();
    assert!(valid.success);

    let invalid = client.validate_config(&json!({"version": "1.0"})).await.unwrap();
    assert!(!invalid.success);
    assert_eq!(invalid.message.as_deref(), Some("missing required field 'name'"));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"orders\"").unwrap();
    let path = file.path().to_str().unwrap();

    let loaded = client.load_config(path).await.unwrap();
    assert!(loaded.success);
    assert_eq!(core.lock().unwrap().loaded_config(), Some(path));

    let missing = client.load_config("/no/such/operator.toml").await.unwrap();
    assert!(!missing.success);
    assert!(missing.message.unwrap().contains("/no/such/operator.toml"));
}

#[tokio::test]
async fn test_metadata() {
    let (server, _core) = core_responder::start().await;
    let client = HttpClient::new(server.uri()).unwrap();

    let metadata = client.get_metadata().await.unwrap();

    assert_eq!(metadata.name, mock_core::NAME);
    assert_eq!(metadata.version, mock_core::VERSION);
    assert_eq!(metadata.description.as_deref(), Some("In-memory OperRouter core"));
}

#[tokio::test]
async fn test_datasource_lifecycle() {
    let (server, core) = core_responder::start().await;
    let client = HttpClient::new(server.uri()).unwrap();

    let config = DataSourceConfig::new("postgres", "localhost", 5432, "testdb")
        .with_credentials("root", "secret");
    assert!(client.create_datasource("main", &config).await.unwrap().success);

    let duplicate = client.create_datasource("main", &config).await.unwrap();
    assert!(!duplicate.success);

    let mut row = Row::new();
    row.insert("name".into(), "Test User".into());
    row.insert("age".into(), Value::Int(30));
    row.insert("score".into(), Value::Float(99.5));
    row.insert("active".into(), Value::Bool(true));
    row.insert("nickname".into(), Value::Null);
    assert!(client.insert_datasource("main", &row).await.unwrap().success);
    assert_eq!(core.lock().unwrap().rows("main").unwrap().len(), 1);

    let query = client
        .query_datasource("main", "SELECT * FROM users LIMIT 10")
        .await
        .unwrap();
    assert!(query.success);
    assert_eq!(query.rows, vec![row]);

    let health = client.ping_datasource("main").await.unwrap();
    assert!(health.success, "healthy-only replies count as success");

    assert!(
        client
            .execute_datasource("main", "DELETE FROM users")
            .await
            .unwrap()
            .success
    );
    assert!(client.close_datasource("main").await.unwrap().success);

    let gone = client.ping_datasource("main").await.unwrap();
    assert!(!gone.success);
    assert_eq!(gone.message.as_deref(), Some("datasource 'main' not found"));
}

#[tokio::test]
async fn test_llm_lifecycle() {
    let (server, _core) = core_responder::start().await;
    let client = HttpClient::new(server.uri()).unwrap();

    let config = LlmConfig::new("openai", "gpt-4").with_api_key("sk-test");
    assert!(client.create_llm("writer", &config).await.unwrap().success);

    let generated = client.generate_llm("writer", "Hello").await.unwrap();
    assert!(generated.success);
    assert_eq!(generated.text, "[gpt-4] Hello");

    let chat = client
        .chat_llm(
            "writer",
            &[
                ChatMessage::system("You are terse."),
                ChatMessage::user("What is Rust?"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(chat.text, "[gpt-4] reply to: What is Rust?");

    let embedding = client.embedding_llm("writer", "Hello").await.unwrap();
    assert_eq!(embedding.embedding, mock_core::embedding("Hello"));

    assert!(client.ping_llm("writer").await.unwrap().success);
    assert!(client.close_llm("writer").await.unwrap().success);

    let gone = client.generate_llm("writer", "Hello").await.unwrap();
    assert!(!gone.success);
    assert!(gone.text.is_empty());
}

#[tokio::test]
async fn test_embedding_keeps_double_precision() {
    let server = server_replying(ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": {"success": true, "embedding": [0.123456789012345, -1e-300]},
        "id": 1,
    })))
    .await;

    let client = HttpClient::new(server.uri()).unwrap();
    let embedding = client.embedding_llm("writer", "Hello").await.unwrap();

    assert_eq!(embedding.embedding, vec![0.123456789012345, -1e-300]);
}

#[tokio::test]
async fn test_query_rows_keep_column_order() {
    let server = server_replying(ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": {
            "success": true,
            "rows": [{"name": "Ada", "email": "ada@example.com", "age": 36}],
        },
        "id": 1,
    })))
    .await;

    let client = HttpClient::new(server.uri()).unwrap();
    let query = client
        .query_datasource("main", "SELECT name, email, age FROM users")
        .await
        .unwrap();

    assert_eq!(
        query.rows[0].keys().collect::<Vec<_>>(),
        ["name", "email", "age"]
    );
}
