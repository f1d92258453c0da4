use std::net::SocketAddr;
use std::process;

use clap::{App, Arg, ArgMatches, SubCommand};
use geth_rpc::mock::{self, MockNode};
use geth_rpc::{ConfigRecord, ConnectionConfig, RpcClient, METHODS};
use log::debug;
use serde_json::Value;

fn main() {
    env_logger::init();

    let matches = App::new("geth-rpc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("JSON-RPC client for Ethereum nodes")
        .arg(Arg::with_name("NODE")
            .long("node")
            .short("n")
            .takes_value(true)
            .env("GETH_RPC_NODE")
            .global(true)
            .help("Node address: host, host:port or a bare port"))
        .arg(Arg::with_name("TIMEOUT")
            .long("timeout")
            .takes_value(true)
            .global(true)
            .help("Request timeout in seconds"))
        .subcommand(SubCommand::with_name("call")
            .about("Invoke any RPC method")
            .arg(Arg::with_name("METHOD")
                .help("Method name, e.g. eth_getBlockByNumber")
                .required(true)
                .index(1))
            .arg(Arg::with_name("PARAMS")
                .help("Positional params; each is parsed as JSON, otherwise sent as a string")
                .multiple(true)
                .index(2)))
        .subcommand(SubCommand::with_name("block-number")
            .about("Get the latest block number"))
        .subcommand(SubCommand::with_name("client-version")
            .about("Get the node's client version"))
        .subcommand(SubCommand::with_name("balance")
            .about("Get balance")
            .arg(Arg::with_name("ADDRESS")
                .help("The account address")
                .required(true)
                .index(1))
            .arg(Arg::with_name("TAG")
                .help("Block tag or number")
                .default_value("latest")
                .index(2)))
        .subcommand(SubCommand::with_name("methods")
            .about("List the methods with named wrappers"))
        .subcommand(SubCommand::with_name("mock-node")
            .about("Starts a local mock node")
            .arg(Arg::with_name("PORT")
                .long("port")
                .short("p")
                .takes_value(true)
                .default_value("8545")
                .help("Port to listen on")))
        .get_matches();

    if let Err(e) = dispatch(&matches) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn dispatch(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("call", Some(sub)) => {
            let method = sub.value_of("METHOD").unwrap_or_default();
            let params: Vec<Value> = sub
                .values_of("PARAMS")
                .map(|vals| vals.map(parse_param).collect())
                .unwrap_or_default();
            let client = connect(sub)?;
            print_result(client.invoke(method, params)?)
        }
        ("block-number", Some(sub)) => print_result(connect(sub)?.eth_block_number()?),
        ("client-version", Some(sub)) => print_result(connect(sub)?.web3_client_version()?),
        ("balance", Some(sub)) => {
            let address = sub.value_of("ADDRESS").unwrap_or_default();
            let tag = sub.value_of("TAG").unwrap_or("latest");
            print_result(connect(sub)?.eth_get_balance(address, tag)?)
        }
        ("methods", Some(_)) => {
            for method in METHODS {
                println!("{}", method);
            }
            Ok(())
        }
        ("mock-node", Some(sub)) => {
            let port: u16 = sub.value_of("PORT").unwrap_or("8545").parse()?;
            mock::run(MockNode::new(), SocketAddr::from(([127, 0, 0, 1], port)))?;
            Ok(())
        }
        _ => {
            println!("{}", matches.usage());
            Ok(())
        }
    }
}

// Global args land in the subcommand's matches.
fn connect(matches: &ArgMatches) -> Result<RpcClient, Box<dyn std::error::Error>> {
    let mut record = match matches.value_of("NODE") {
        Some(node) => node_record(node)?,
        None => ConfigRecord::default(),
    };
    if let Some(secs) = matches.value_of("TIMEOUT") {
        record.timeout = Some(secs.parse()?);
    }
    let client = RpcClient::new(record)?;
    debug!("connected to {}", client.config().url());
    Ok(client)
}

// A bare number is a port; anything else goes through the host[:port] rules.
fn node_record(node: &str) -> Result<ConfigRecord, Box<dyn std::error::Error>> {
    let config = match node.parse::<u16>() {
        Ok(port) => ConnectionConfig::from_input(port)?,
        Err(_) => ConnectionConfig::from_input(node)?,
    };
    Ok(ConfigRecord {
        host: Some(config.host),
        port: Some(config.port.into()),
        ..Default::default()
    })
}

fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn print_result(result: Option<Value>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("null"),
    }
    Ok(())
}
