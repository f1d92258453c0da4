//! A small stand-in for an Ethereum node, good enough to point the client at
//! during development and in tests. Heights advance on a fixed block time and
//! balances come from whatever accounts the node was seeded with.

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::time::interval;
use warp::Filter;

use crate::config::DEFAULT_VERSION;
use crate::rpc::{RpcRequest, RpcResponse};

pub const NETWORK_ID: &str = "1337";
pub const DEFAULT_BLOCK_TIME: Duration = Duration::from_secs(10);

const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone)]
pub struct MockNode {
    accounts: BTreeMap<String, u128>,
    block_time: Duration,
}

impl Default for MockNode {
    fn default() -> Self {
        MockNode {
            accounts: BTreeMap::new(),
            block_time: DEFAULT_BLOCK_TIME,
        }
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Addresses are matched case-insensitively.
    pub fn with_account(mut self, address: &str, balance: u128) -> Self {
        self.accounts.insert(address.to_lowercase(), balance);
        self
    }

    pub fn with_block_time(mut self, block_time: Duration) -> Self {
        self.block_time = block_time;
        self
    }
}

#[derive(Clone)]
struct NodeState {
    accounts: Arc<Mutex<BTreeMap<String, u128>>>,
    genesis_time: Instant,
    block_time: Duration,
}

impl NodeState {
    fn new(node: MockNode) -> Self {
        NodeState {
            accounts: Arc::new(Mutex::new(node.accounts)),
            genesis_time: Instant::now(),
            block_time: node.block_time,
        }
    }

    fn height(&self) -> u64 {
        let elapsed = self.genesis_time.elapsed().as_millis();
        let block = self.block_time.as_millis().max(1);
        (elapsed / block) as u64
    }
}

fn client_version() -> String {
    format!("geth-rpc-mock/v{}", env!("CARGO_PKG_VERSION"))
}

fn handle_rpc(req: RpcRequest, state: NodeState) -> warp::reply::Json {
    debug!("mock node <- {} id={}", req.method, req.id);
    let id = json!(req.id);
    let result = match req.method.as_str() {
        "web3_clientVersion" => Ok(json!(client_version())),
        "net_version" => Ok(json!(NETWORK_ID)),
        "net_listening" => Ok(json!(true)),
        "eth_syncing" => Ok(json!(false)),
        "eth_blockNumber" => Ok(json!(format!("{:#x}", state.height()))),
        "eth_accounts" => {
            let accounts = state.accounts.lock().unwrap_or_else(|e| e.into_inner());
            Ok(json!(accounts.keys().collect::<Vec<_>>()))
        }
        "eth_getBalance" => match req.params.first().and_then(Value::as_str) {
            Some(address) => {
                let accounts = state.accounts.lock().unwrap_or_else(|e| e.into_inner());
                let balance = accounts.get(&address.to_lowercase()).copied().unwrap_or(0);
                Ok(json!(format!("{balance:#x}")))
            }
            None => Err((INVALID_PARAMS, "invalid params".to_owned())),
        },
        // Unknown or pending transactions have no receipt.
        "eth_getTransactionReceipt" => Ok(Value::Null),
        other => Err((
            METHOD_NOT_FOUND,
            format!("the method {other} does not exist/is not available"),
        )),
    };

    let response = match result {
        Ok(value) => RpcResponse::success(DEFAULT_VERSION, id, value),
        Err((code, message)) => RpcResponse::failure(DEFAULT_VERSION, id, code, message),
    };
    warp::reply::json(&response)
}

fn routes(
    state: NodeState,
) -> impl Filter<Extract = (warp::reply::Json,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    warp::path::end()
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter)
        .map(handle_rpc)
}

/// Bind on `addr` and return the bound address plus the server future.
/// Must be called from inside a tokio runtime.
fn bind(
    node: MockNode,
    addr: SocketAddr,
    signal: impl Future<Output = ()> + Send + 'static,
) -> io::Result<(SocketAddr, impl Future<Output = ()>)> {
    let state = NodeState::new(node);

    // tokio rejects a zero period.
    let mut ticker = interval(state.block_time.max(Duration::from_millis(1)));
    let ticking = state.clone();
    tokio::spawn(async move {
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!("block {} mined", ticking.height());
        }
    });

    warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, signal)
        .map_err(|e| io::Error::new(io::ErrorKind::AddrNotAvailable, e.to_string()))
}

/// Serve on `addr` until ctrl-c.
pub fn run(node: MockNode, addr: SocketAddr) -> io::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {e}");
            }
        };
        let (addr, server) = bind(node, addr, signal)?;
        info!("mock node running on http://{addr}");
        server.await;
        info!("mock node stopped");
        Ok::<(), io::Error>(())
    })
}

/// A mock node running on its own thread. Stops when dropped.
pub struct MockHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `"127.0.0.1:<port>"`, ready to hand to `RpcClient::new`.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn shutdown(self) {}
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("mock node thread panicked");
            }
        }
    }
}

/// Start `node` on an ephemeral loopback port in a background thread.
pub fn spawn(node: MockNode) -> io::Result<MockHandle> {
    let (addr_tx, addr_rx) = mpsc::channel::<io::Result<SocketAddr>>();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let thread = thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                let _ = addr_tx.send(Err(e));
                return;
            }
        };
        rt.block_on(async move {
            let signal = async move {
                let _ = stop_rx.await;
            };
            match bind(node, SocketAddr::from(([127, 0, 0, 1], 0)), signal) {
                Ok((addr, server)) => {
                    let _ = addr_tx.send(Ok(addr));
                    server.await;
                }
                Err(e) => {
                    let _ = addr_tx.send(Err(e));
                }
            }
        });
    });

    let addr = addr_rx
        .recv()
        .map_err(|_| io::Error::other("mock node thread exited before binding"))??;
    debug!("mock node spawned on {addr}");
    Ok(MockHandle {
        addr,
        shutdown: Some(stop_tx),
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> NodeState {
        NodeState::new(MockNode::new().with_account("0xABC", 255))
    }

    fn call(method: &str, params: Vec<Value>) -> RpcRequest {
        RpcRequest::new("2.0", method, params, 9)
    }

    #[tokio::test]
    async fn answers_balance_for_seeded_account() {
        let resp = warp::test::request()
            .method("POST")
            .path("/")
            .json(&call("eth_getBalance", vec![json!("0xabc"), json!("latest")]))
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 200);
        let body: RpcResponse = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.id, json!(9));
        assert_eq!(body.result, Some(json!("0xff")));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let resp = warp::test::request()
            .method("POST")
            .path("/")
            .json(&call("debug_traceTransaction", vec![]))
            .reply(&routes(state()))
            .await;
        let body: RpcResponse = serde_json::from_slice(resp.body()).unwrap();
        let err = body.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert!(err.message.contains("debug_traceTransaction"));
    }

    #[tokio::test]
    async fn balance_without_address_is_invalid_params() {
        let resp = warp::test::request()
            .method("POST")
            .path("/")
            .json(&call("eth_getBalance", vec![json!(7)]))
            .reply(&routes(state()))
            .await;
        let body: RpcResponse = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn rejects_get_requests() {
        let resp = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 405);
    }

    #[test]
    fn height_follows_block_time() {
        let mut state = state();
        state.block_time = Duration::from_millis(10);
        state.genesis_time = Instant::now() - Duration::from_millis(55);
        assert_eq!(state.height(), 5);
    }
}
