use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything an invocation can fail with. Each call fails with exactly one
/// of these, and none of them is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP exchange itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The node answered with a JSON-RPC error object. Code and message are
    /// the node's own.
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The response body was not a JSON-RPC envelope, or a result did not
    /// fit the requested type.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The server error code, if this is an `Rpc` error.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Error::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Decode(value.to_string())
    }
}
