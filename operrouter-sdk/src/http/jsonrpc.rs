//! JSON-RPC 2.0 envelopes.
use serde::{Deserialize, Serialize};

pub const VERSION: &str = "2.0";

/// An outgoing call.
#[derive(Debug, Serialize)]
pub struct Request<'a, P> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
}

impl<'a, P: Serialize> Request<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: VERSION,
            method,
            params,
            id,
        }
    }
}

/// An incoming reply. Exactly one of `result` and `error` is expected.
#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// The structured `error` member of a reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Reads an `error` member. Servers that send a bare string or any other shape
    /// still produce an error, with code 0 and the raw member as message.
    pub fn from_member(member: serde_json::Value) -> Self {
        match serde_json::from_value::<RpcError>(member.clone()) {
            Ok(err) => err,
            Err(_) => RpcError {
                code: 0,
                message: match member {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
                data: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_envelope_shape() {
        let request = Request::new(7, "datasource.ping", json!({"name": "my_pg"}));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "method": "datasource.ping", "params": {"name": "my_pg"}, "id": 7})
        );
    }

    #[test]
    fn structured_errors_are_read_as_is() {
        let err = RpcError::from_member(json!({"code": -32601, "message": "Method not found"}));
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
    }

    #[test]
    fn unstructured_errors_are_kept() {
        assert_eq!(RpcError::from_member(json!("boom")).message, "boom");
        assert_eq!(RpcError::from_member(json!({"reason": 1})).message, r#"{"reason":1}"#);
    }
}
