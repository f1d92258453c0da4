use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use geth_rpc::mock::{self, MockNode, NETWORK_ID};
use geth_rpc::{ConfigRecord, Error, HttpTransport, RpcClient, TransportErrorKind};
use serde_json::{json, Value};

const ADDRESS: &str = "0x407d73d8a49eeb85d32cf465507dd71d507100c1";

fn node() -> MockNode {
    MockNode::new().with_account(ADDRESS, 1_000_000_000_000_000_000)
}

#[test]
fn block_number_over_http() {
    let node = mock::spawn(node()).unwrap();
    let client = RpcClient::new(node.address()).unwrap();

    let height = client.invoke("eth_blockNumber", vec![]).unwrap();
    assert_eq!(height, Some(json!("0x0")));
    assert_eq!(client.latest_id(), 1);
}

#[test]
fn wrappers_reach_the_node() {
    let node = mock::spawn(node()).unwrap();
    let client = RpcClient::new(node.address()).unwrap();

    assert_eq!(
        client.eth_get_balance(ADDRESS, "latest").unwrap(),
        Some(json!("0xde0b6b3a7640000"))
    );
    assert_eq!(client.net_version().unwrap(), Some(json!(NETWORK_ID)));
    assert_eq!(client.net_listening().unwrap(), Some(json!(true)));

    let accounts: Vec<String> = client.invoke_as("eth_accounts", vec![]).unwrap();
    assert_eq!(accounts, vec![ADDRESS.to_owned()]);
    assert_eq!(client.latest_id(), 4);
}

#[test]
fn node_errors_come_back_verbatim() {
    let node = mock::spawn(node()).unwrap();
    let client = RpcClient::new(node.address()).unwrap();

    match client.invoke("eth_compileSerpent", vec![json!("code")]) {
        Err(Error::Rpc { code, message, .. }) => {
            assert_eq!(code, -32601);
            assert_eq!(
                message,
                "the method eth_compileSerpent does not exist/is not available"
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let err = client.invoke("eth_getBalance", vec![]).unwrap_err();
    assert_eq!(err.rpc_code(), Some(-32602));
}

#[test]
fn null_result_is_not_absence() {
    let node = mock::spawn(node()).unwrap();
    let client = RpcClient::new(node.address()).unwrap();

    let receipt = client.eth_get_transaction_receipt("0x1234").unwrap();
    assert_eq!(receipt, Some(Value::Null));
}

#[test]
fn refused_connection_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let record = ConfigRecord {
        port: Some(port.into()),
        timeout: Some(5),
        ..Default::default()
    };
    let client = RpcClient::new(record).unwrap();

    match client.invoke("web3_clientVersion", vec![]) {
        Err(Error::Transport(e)) => assert_eq!(e.kind, TransportErrorKind::Connect),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(client.latest_id(), 1);
}

#[test]
fn shared_client_over_http_issues_every_id_once() {
    let node = mock::spawn(node()).unwrap();
    let client = Arc::new(RpcClient::new(node.address()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    client.web3_client_version().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(client.latest_id(), 40);
}

/// Reads one HTTP request (headers plus `Content-Length` bytes of body).
fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

/// Answers a single request with `status` and `body` after `delay`.
fn respond_once(status: &'static str, body: &'static str, delay: Duration) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            thread::sleep(delay);
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
        }
    });
    port
}

fn client_for(port: u16, timeout: u64) -> RpcClient<HttpTransport> {
    RpcClient::new(ConfigRecord {
        port: Some(port.into()),
        timeout: Some(timeout),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn empty_body_is_a_transport_error() {
    let port = respond_once("200 OK", "", Duration::ZERO);
    let client = client_for(port, 5);

    match client.invoke("eth_blockNumber", vec![]) {
        Err(Error::Transport(e)) => {
            assert_eq!(e.kind, TransportErrorKind::Status);
            assert_eq!(e.status, Some(200));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn error_envelope_on_server_error_status_is_an_rpc_error() {
    let port = respond_once(
        "500 Internal Server Error",
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"boom"}}"#,
        Duration::ZERO,
    );
    let client = client_for(port, 5);

    match client.invoke("eth_sendRawTransaction", vec![json!("0xf86c")]) {
        Err(Error::Rpc { code, message, .. }) => {
            assert_eq!(code, -32000);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn slow_node_times_out_as_transport_error() {
    let port = respond_once(
        "200 OK",
        r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#,
        Duration::from_secs(3),
    );
    let client = client_for(port, 1);

    match client.invoke("eth_blockNumber", vec![]) {
        Err(Error::Transport(e)) => assert_eq!(e.kind, TransportErrorKind::Timeout),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn zero_block_time_still_serves() {
    let node = mock::spawn(MockNode::new().with_block_time(Duration::ZERO)).unwrap();
    let client = RpcClient::new(node.address()).unwrap();

    let height = client.invoke("eth_blockNumber", vec![]).unwrap();
    assert!(height.as_ref().and_then(Value::as_str).is_some_and(|h| h.starts_with("0x")));
}
