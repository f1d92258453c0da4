use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ConfigInput, ConnectionConfig};
use crate::error::{Error, Result};
use crate::rpc::{RpcRequest, RpcResponse};
use crate::transport::{HttpTransport, Transport};

/// A JSON-RPC client bound to one node.
///
/// Any method name can be invoked; nothing is checked against a catalog.
/// Request ids start at 1 and increase by one per call. Id assignment and the
/// HTTP round-trip happen under one lock, so concurrent callers sharing a
/// client never see the same id and never interleave on the transport.
///
/// The transport is acquired on construction and closed exactly once when
/// the client is dropped (or explicitly via [`RpcClient::close`]).
pub struct RpcClient<T: Transport = HttpTransport> {
    config: ConnectionConfig,
    url: String,
    latest_id: AtomicU64,
    transport: Mutex<T>,
}

impl RpcClient<HttpTransport> {
    /// Build a client over HTTP. `input` may be `()`, a port, a
    /// `"host[:port]"` string or a [`ConfigRecord`](crate::ConfigRecord).
    pub fn new(input: impl Into<ConfigInput>) -> Result<Self> {
        let config = ConnectionConfig::from_input(input)?;
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::from_parts(config, transport))
    }
}

impl<T: Transport> RpcClient<T> {
    pub fn with_transport(input: impl Into<ConfigInput>, transport: T) -> Result<Self> {
        let config = ConnectionConfig::from_input(input)?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: ConnectionConfig, transport: T) -> Self {
        RpcClient {
            url: config.url(),
            config,
            latest_id: AtomicU64::new(0),
            transport: Mutex::new(transport),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The id of the most recent request, or 0 before the first one.
    pub fn latest_id(&self) -> u64 {
        self.latest_id.load(Ordering::SeqCst)
    }

    /// Call `method` with positional `params`.
    ///
    /// Returns `Ok(None)` when the node's reply carries neither `result` nor
    /// `error`; that is a successful call with nothing to report.
    pub fn invoke(&self, method: &str, params: Vec<Value>) -> Result<Option<Value>> {
        let (id, body) = {
            let mut transport = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
            let id = self.latest_id.fetch_add(1, Ordering::SeqCst) + 1;

            let request = RpcRequest::new(&self.config.version, method, params, id);
            let body = serde_json::to_vec(&request)?;
            debug!("-> {} id={} ({} bytes)", method, id, body.len());

            let headers = [
                ("Content-Type", "application/json".to_owned()),
                ("Content-Length", body.len().to_string()),
            ];
            (id, transport.post(&self.url, &headers, body)?)
        };
        decode_response(id, &body)
    }

    /// Like [`invoke`](Self::invoke), but deserializes the result into `R`.
    /// A missing result is read as `null`.
    pub fn invoke_as<R: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<R> {
        let value = self.invoke(method, params)?.unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| Error::Decode(format!("{method} result: {e}")))
    }

    /// Release the transport now instead of at the end of scope.
    pub fn close(self) {}
}

impl<T: Transport> Drop for RpcClient<T> {
    fn drop(&mut self) {
        self.transport
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
    }
}

fn decode_response(id: u64, body: &[u8]) -> Result<Option<Value>> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(Error::Decode(format!("expected a response object, got {value}")));
    }
    let response: RpcResponse = serde_json::from_value(value)?;

    if response.id != Value::from(id) {
        warn!("response id {} does not match request id {}", response.id, id);
    }
    if let Some(err) = response.error {
        debug!("<- id={} error {}", id, err.code);
        return Err(Error::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }
    Ok(response.result)
}
