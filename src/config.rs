use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8545;
pub const DEFAULT_VERSION: &str = "2.0";

/// How a caller intends to access result fields. The client decodes every
/// response into the same `serde_json::Value` either way; this only records
/// the preference for layers built on top.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultShape {
    /// Nested mappings and sequences (`assoc = true`).
    #[default]
    Map,
    /// Structured, typed objects (`assoc = false`).
    Object,
}

/// Caller overrides, merged key by key over the defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigRecord {
    pub version: Option<String>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub assoc: Option<bool>,
    /// Transport timeout in seconds.
    pub timeout: Option<u64>,
}

/// The accepted construction inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigInput {
    None,
    Port(u16),
    /// `"host"` or `"host:port"`.
    Address(String),
    Record(ConfigRecord),
}

impl From<()> for ConfigInput {
    fn from(_: ()) -> Self {
        ConfigInput::None
    }
}

impl From<u16> for ConfigInput {
    fn from(port: u16) -> Self {
        ConfigInput::Port(port)
    }
}

impl From<&str> for ConfigInput {
    fn from(addr: &str) -> Self {
        ConfigInput::Address(addr.to_owned())
    }
}

impl From<String> for ConfigInput {
    fn from(addr: String) -> Self {
        ConfigInput::Address(addr)
    }
}

impl From<ConfigRecord> for ConfigInput {
    fn from(record: ConfigRecord) -> Self {
        ConfigInput::Record(record)
    }
}

impl<T: Into<ConfigInput>> From<Option<T>> for ConfigInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ConfigInput::None)
    }
}

/// Effective connection settings. Fixed once a client is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub version: String,
    pub shape: ResultShape,
    pub timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            version: DEFAULT_VERSION.into(),
            shape: ResultShape::default(),
            timeout: None,
        }
    }
}

impl ConnectionConfig {
    pub fn from_input(input: impl Into<ConfigInput>) -> Result<Self> {
        let record = match input.into() {
            ConfigInput::None => ConfigRecord::default(),
            ConfigInput::Port(port) => ConfigRecord {
                port: Some(port.into()),
                ..Default::default()
            },
            ConfigInput::Address(addr) => parse_address(&addr)?,
            ConfigInput::Record(record) => record,
        };
        Self::default().merge(record)
    }

    fn merge(mut self, record: ConfigRecord) -> Result<Self> {
        if let Some(version) = record.version {
            self.version = version;
        }
        if let Some(host) = record.host {
            if host.is_empty() {
                return Err(Error::Config("empty host".into()));
            }
            self.host = host;
        }
        if let Some(port) = record.port {
            self.port = check_port(port)?;
        }
        if let Some(assoc) = record.assoc {
            self.shape = if assoc {
                ResultShape::Map
            } else {
                ResultShape::Object
            };
        }
        if let Some(secs) = record.timeout {
            self.timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }

    /// Endpoint all requests are posted to.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

fn check_port(port: i64) -> Result<u16> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(Error::Config(format!("port {port} out of range"))),
    }
}

// "host:port" only when the host has no colon and the port is all digits;
// anything else is taken as a bare host. The text is used as given.
fn parse_address(addr: &str) -> Result<ConfigRecord> {
    if addr.is_empty() {
        return Ok(ConfigRecord::default());
    }
    if let Some((host, port)) = addr.split_once(':') {
        let digits = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
        if !host.is_empty() && digits {
            let port = port
                .parse::<i64>()
                .map_err(|_| Error::Config(format!("port {port} out of range")))?;
            return Ok(ConfigRecord {
                host: Some(host.to_owned()),
                port: Some(port),
                ..Default::default()
            });
        }
    }
    Ok(ConfigRecord {
        host: Some(addr.to_owned()),
        ..Default::default()
    })
}
