use native_core::{
    EMPTY_PROTO_REQUEST_HAD_POINTER, NULL_PROTO_FREES, bindings, client, client_with,
    freed_count, get_metadata_proto_empty, ping_invalid_json, ping_invalid_utf8, ping_null,
    ping_proto_null, version_null,
};
use operrouter_sdk::{
    ChatMessage, DataSourceConfig, Error, FfiClient, LlmConfig, OperRouterClient, Row, Value,
    ffi::{FfiBindings, FfiError, ProtoBindings, proto},
};
use serde_json::json;
use std::{io::Write, sync::atomic::Ordering};


#[tokio::test]
async fn test_reply_is_freed_exactly_once() {
    let client = client();

    let pong = client.ping().await.unwrap();

    assert!(pong.success);
    let marker = pong.message.unwrap();
    assert!(marker.starts_with("pong-"));
    assert_eq!(freed_count(&format!("\"{marker}\"")), 1);
}

#[tokio::test]
async fn test_reply_is_freed_when_decoding_fails() {
    let client = client_with(FfiBindings {
        ping: ping_invalid_json,
        ..bindings()
    });

    let err = client.ping().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Ffi(FfiError::Decode {
            symbol: "operrouter_ping",
            ..
        })
    ));
    assert_eq!(freed_count("invalid-reply-marker"), 1);
}

#[tokio::test]
async fn test_reply_is_freed_when_utf8_is_invalid() {
    let client = client_with(FfiBindings {
        ping: ping_invalid_utf8,
        ..bindings()
    });

    let err = client.ping().await.unwrap_err();

    assert!(matches!(err, Error::Ffi(FfiError::InvalidUtf8 { .. })));
    assert_eq!(freed_count("\u{fffd}\u{fffd}utf"), 1);
}

#[tokio::test]
async fn test_null_reply_is_a_transport_error() {
    let client = client_with(FfiBindings {
        ping: ping_null,
        ..bindings()
    });

    let err = client.ping().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Ffi(FfiError::NullResponse {
            symbol: "operrouter_ping"
        })
    ));
}

#[tokio::test]
async fn test_interior_nul_is_rejected_before_the_call() {
    let client = client();

    let err = client.load_config("bad\0path").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Ffi(FfiError::InvalidArgument {
            symbol: "operrouter_load_config",
            ..
        })
    ));
}

#[test]
fn test_version_is_static() {
    assert_eq!(client().version().unwrap(), "0.1.0-test");

    let client = client_with(FfiBindings {
        version: version_null,
        ..bindings()
    });
    assert!(matches!(
        client.version(),
        Err(FfiError::NullResponse { .. })
    ));
}

#[tokio::test]
async fn test_config_operations() {
    let client = client();

    assert!(
        client
            .validate_config(&json!({"name": "orders"}))
            .await
            .unwrap()
            .success
    );
    assert!(!client.validate_config(&json!({})).await.unwrap().success);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"orders\"").unwrap();
    let loaded = client
        .load_config(file.path().to_str().unwrap())
        .await
        .unwrap();
    assert!(loaded.success);

    let metadata = client.get_metadata().await.unwrap();
    assert_eq!(metadata.name, mock_core::NAME);
}

#[tokio::test]
async fn test_datasource_and_llm_operations() {
    let client = client();

    let config = DataSourceConfig::new("postgres", "localhost", 5432, "ffi_db");
    assert!(client.create_datasource("ffi_db", &config).await.unwrap().success);

    let mut row = Row::new();
    row.insert("name".into(), "Test User".into());
    row.insert("age".into(), Value::Int(30));
    assert!(client.insert_datasource("ffi_db", &row).await.unwrap().success);

    let query = client
        .query_datasource("ffi_db", "SELECT * FROM users")
        .await
        .unwrap();
    assert_eq!(query.rows, vec![row]);
    assert!(client.ping_datasource("ffi_db").await.unwrap().success);
    assert!(
        client
            .execute_datasource("ffi_db", "DELETE FROM users")
            .await
            .unwrap()
            .success
    );
    assert!(client.close_datasource("ffi_db").await.unwrap().success);

    let llm = LlmConfig::new("local", "tiny");
    assert!(client.create_llm("ffi_llm", &llm).await.unwrap().success);
    assert_eq!(
        client.generate_llm("ffi_llm", "Hi").await.unwrap().text,
        "[tiny] Hi"
    );
    assert_eq!(
        client
            .chat_llm("ffi_llm", &[ChatMessage::user("Hello")])
            .await
            .unwrap()
            .text,
        "[tiny] reply to: Hello"
    );
    assert_eq!(
        client
            .embedding_llm("ffi_llm", "Hi")
            .await
            .unwrap()
            .embedding,
        mock_core::embedding("Hi")
    );
    assert!(client.ping_llm("ffi_llm").await.unwrap().success);
    assert!(client.close_llm("ffi_llm").await.unwrap().success);
}

#[tokio::test]
async fn test_proto_ping_passes_a_pointer_for_empty_requests() {
    let client = client();

    let pong = client.ping_proto().await.unwrap();

    assert_eq!(pong.status, "ok");
    assert_eq!(pong.version, "0.1.0-test");
    assert!(EMPTY_PROTO_REQUEST_HAD_POINTER.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_proto_operations() {
    let client = client();
    assert!(client.supports_proto());

    let valid = client
        .validate_config_proto("name = \"orders\"")
        .await
        .unwrap();
    assert!(valid.valid);
    assert!(valid.errors.is_empty());

    let invalid = client.validate_config_proto("version = 1").await.unwrap();
    assert!(!invalid.valid);
    assert_eq!(invalid.errors, vec!["missing required field 'name'"]);

    let metadata = client.get_metadata_proto().await.unwrap().metadata.unwrap();
    assert_eq!(metadata.name, mock_core::NAME);

    let missing = client
        .load_config_proto("/no/such/operator.toml")
        .await
        .unwrap();
    assert!(!missing.success);
    assert_eq!(missing.error, "failed to read '/no/such/operator.toml'");
}

#[tokio::test]
async fn test_empty_proto_reply_decodes_as_default() {
    let client = client_with(FfiBindings {
        proto: Some(ProtoBindings {
            get_metadata: get_metadata_proto_empty,
            ..bindings().proto.unwrap()
        }),
        ..bindings()
    });

    let reply = client.get_metadata_proto().await.unwrap();

    assert_eq!(reply, proto::GetMetadataResponse::default());
}

#[tokio::test]
async fn test_null_proto_reply_is_a_transport_error() {
    let client = client_with(FfiBindings {
        proto: Some(ProtoBindings {
            ping: ping_proto_null,
            ..bindings().proto.unwrap()
        }),
        ..bindings()
    });

    let err = client.ping_proto().await.unwrap_err();

    assert!(matches!(
        err,
        FfiError::NullResponse {
            symbol: "ping_proto"
        }
    ));
    assert_eq!(NULL_PROTO_FREES.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_proto_symbols() {
    let client = client_with(FfiBindings {
        proto: None,
        ..bindings()
    });

    assert!(!client.supports_proto());
    let err = client.ping_proto().await.unwrap_err();
    assert!(matches!(
        err,
        FfiError::Unsupported {
            symbol: "ping_proto"
        }
    ));

    // The JSON entry points keep working without them.
    assert!(client.ping().await.unwrap().success);
}

#[test]
fn test_missing_library() {
    let err = FfiClient::load(Some(std::path::Path::new("/no/such/liboperrouter.so"))).unwrap_err();

    assert!(matches!(err, FfiError::LibraryNotFound { .. }));
    assert!(err.to_string().contains("/no/such/liboperrouter.so"));
}
