//! A JSON-RPC 2.0 client for Ethereum-style nodes over HTTP.
//!
//! ```no_run
//! use geth_rpc::RpcClient;
//!
//! let client = RpcClient::new("127.0.0.1:8545")?;
//! let height = client.invoke("eth_blockNumber", vec![])?;
//! let balance = client.eth_get_balance("0x407d73d8a49eeb85d32cf465507dd71d507100c1", "latest")?;
//! # Ok::<(), geth_rpc::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod methods;
pub mod mock;
pub mod rpc;
pub mod transport;

pub use client::RpcClient;
pub use config::{ConfigInput, ConfigRecord, ConnectionConfig, ResultShape};
pub use error::{Error, Result};
pub use methods::METHODS;
pub use rpc::{ErrorObject, RpcRequest, RpcResponse};
pub use transport::{HttpTransport, Transport, TransportError, TransportErrorKind};
