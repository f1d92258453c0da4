// src/rpc.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON-RPC request as it goes over the wire. Arguments are always
/// positional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(version: &str, method: &str, params: Vec<Value>, id: u64) -> Self {
        RpcRequest {
            jsonrpc: version.into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A decoded response envelope.
///
/// `result` distinguishes a missing member (`None`) from an explicit `null`
/// (`Some(Value::Null)`). An `error` member set to `null` decodes as `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl RpcResponse {
    pub fn success(version: &str, id: Value, result: Value) -> Self {
        RpcResponse {
            jsonrpc: version.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(version: &str, id: Value, code: i64, message: String) -> Self {
        RpcResponse {
            jsonrpc: version.into(),
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message,
                data: None,
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Only called when the key exists, so a literal `null` stays `Some(Null)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
