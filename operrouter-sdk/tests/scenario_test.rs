//! The same data source session, run through every transport.
use mock_core::MockServer;
use operrouter_sdk::{
    DataSourceConfig, GrpcClient, HttpClient, OperRouterClient, Row, TransportConfig, Value,
    connect,
};


async fn run_postgres_session(client: &dyn OperRouterClient) -> Vec<Row> {
    let config = DataSourceConfig::new("postgres", "localhost", 5432, "testdb")
        .with_credentials("root", "secret");

    let created = client.create_datasource("my_postgres", &config).await.unwrap();
    assert!(created.success, "create failed: {:?}", created.message);

    let ddl = client
        .execute_datasource(
            "my_postgres",
            "CREATE TABLE IF NOT EXISTS users (name TEXT, email TEXT)",
        )
        .await
        .unwrap();
    assert!(ddl.success, "execute failed: {:?}", ddl.message);

    let mut row = Row::new();
    row.insert("name".into(), Value::from("Test User"));
    row.insert("email".into(), Value::from("test@example.com"));
    let inserted = client.insert_datasource("my_postgres", &row).await.unwrap();
    assert!(inserted.success, "insert failed: {:?}", inserted.message);

    let query = client
        .query_datasource("my_postgres", "SELECT * FROM users LIMIT 10")
        .await
        .unwrap();
    assert!(query.success, "query failed: {:?}", query.message);

    let closed = client.close_datasource("my_postgres").await.unwrap();
    assert!(closed.success, "close failed: {:?}", closed.message);

    query.rows
}

fn expected_rows() -> Vec<Row> {
    let mut row = Row::new();
    row.insert("name".into(), "Test User".into());
    row.insert("email".into(), "test@example.com".into());
    vec![row]
}

#[tokio::test]
async fn test_session_over_http() {
    let (server, core) = core_responder::start().await;
    let client = HttpClient::new(server.uri()).unwrap();

    assert_eq!(run_postgres_session(&client).await, expected_rows());
    assert!(core.lock().unwrap().datasource_names().is_empty());
}

#[tokio::test]
async fn test_session_over_grpc() {
    let server = MockServer::new();
    let core = server.core();
    let client = GrpcClient::from_service(server.into_service());

    assert_eq!(run_postgres_session(&client).await, expected_rows());
    assert!(core.lock().unwrap().datasource_names().is_empty());

    client.close();
}

#[tokio::test]
async fn test_session_over_ffi() {
    let client = native_core::client();

    assert_eq!(run_postgres_session(&client).await, expected_rows());
}

#[tokio::test]
async fn test_session_through_transport_config() {
    let (server, _core) = core_responder::start().await;
    let config: TransportConfig = serde_json::from_value(serde_json::json!({
        "transport": "http",
        "base_url": server.uri(),
        "timeout_secs": 5,
    }))
    .unwrap();

    let client = connect(&config).await.unwrap();

    assert_eq!(run_postgres_session(client.as_ref()).await, expected_rows());
}
