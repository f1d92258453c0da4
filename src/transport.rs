use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

/// What part of the HTTP exchange went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    /// The server answered but sent nothing usable.
    Status,
    Body,
    Request,
    Closed,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Status => "status",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A failed HTTP exchange, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport {kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// HTTP status, when the server got far enough to send one.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        TransportError {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        let kind = if value.is_timeout() {
            TransportErrorKind::Timeout
        } else if value.is_connect() {
            TransportErrorKind::Connect
        } else if value.is_body() || value.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        let status = value.status().map(|s| s.as_u16());
        TransportError {
            kind,
            status,
            message: value.to_string(),
        }
    }
}

/// The capability to POST a body and get a body back.
///
/// A transport is owned by exactly one client and only ever used while that
/// client holds its lock, so `post` may freely reuse connection state.
pub trait Transport: Send {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;

    /// Release whatever the transport holds. Called once, when its client
    /// goes away.
    fn close(&mut self) {}
}

/// Blocking HTTP transport built on `reqwest`.
pub struct HttpTransport {
    client: Option<Client>,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpTransport {
            client: Some(builder.build()?),
        })
    }
}

impl Transport for HttpTransport {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| TransportError::new(TransportErrorKind::Closed, "transport closed"))?;

        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::new(TransportErrorKind::Request, e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::new(TransportErrorKind::Request, e.to_string()))?;
            map.insert(name, value);
        }

        let response = client.post(url).headers(map).body(body).send()?;
        let status = response.status();
        debug!("{} answered {}", url, status);

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(
                TransportError::new(TransportErrorKind::Status, format!("empty response ({status})"))
                    .with_status(status.as_u16()),
            );
        }
        Ok(bytes.to_vec())
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("http transport closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_transport_rejects_posts() {
        let mut transport = HttpTransport::new(None).unwrap();
        transport.close();
        let err = transport
            .post("http://127.0.0.1:1/", &[], b"{}".to_vec())
            .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Closed);
    }

    #[test]
    fn error_display_names_the_kind() {
        let err = TransportError::new(TransportErrorKind::Connect, "connection refused");
        assert_eq!(err.to_string(), "transport connect error: connection refused");
    }
}
