//! Named wrappers for the Ethereum node RPC surface.
//!
//! Each wrapper forwards its arguments, in order, to [`RpcClient::invoke`]
//! and returns whatever it returns. Nothing here knows what the methods mean;
//! any name missing from this list can still be called through `invoke`.

use serde_json::Value;

use crate::client::RpcClient;
use crate::error::Result;
use crate::transport::Transport;

macro_rules! rpc_methods {
    {
        $(
            $(#[$meta:meta])*
            fn $name:ident($($arg:ident: $arg_ty:ty),*) => $wire:literal;
        )*
    } => {
        /// Wire names of every wrapped method, in catalog order.
        pub const METHODS: &[&str] = &[$($wire),*];

        impl<T: Transport> RpcClient<T> {
            $(
                $(#[$meta])*
                pub fn $name(&self, $($arg: $arg_ty),*) -> Result<Option<Value>> {
                    let params: Vec<Value> = vec![$(serde_json::to_value($arg)?),*];
                    self.invoke($wire, params)
                }
            )*
        }
    }
}

rpc_methods! {
    /// Current client version.
    fn web3_client_version() => "web3_clientVersion";
    /// Keccak-256 of the given hex data.
    fn web3_sha3(data: &str) => "web3_sha3";

    /// Current network id.
    fn net_version() => "net_version";
    fn net_listening() => "net_listening";
    fn net_peer_count() => "net_peerCount";

    fn eth_protocol_version() => "eth_protocolVersion";
    /// Sync status object, or `false` when not syncing.
    fn eth_syncing() => "eth_syncing";
    fn eth_coinbase() => "eth_coinbase";
    fn eth_mining() => "eth_mining";
    fn eth_hashrate() => "eth_hashrate";
    /// Current gas price in wei.
    fn eth_gas_price() => "eth_gasPrice";
    fn eth_accounts() => "eth_accounts";
    fn eth_block_number() => "eth_blockNumber";
    fn eth_get_balance(address: &str, tag: &str) => "eth_getBalance";
    fn eth_get_storage_at(address: &str, position: &str, tag: &str) => "eth_getStorageAt";
    fn eth_get_transaction_count(address: &str, tag: &str) => "eth_getTransactionCount";
    fn eth_get_block_transaction_count_by_hash(hash: &str) => "eth_getBlockTransactionCountByHash";
    fn eth_get_block_transaction_count_by_number(tag: &str) => "eth_getBlockTransactionCountByNumber";
    fn eth_get_uncle_count_by_block_hash(hash: &str) => "eth_getUncleCountByBlockHash";
    fn eth_get_uncle_count_by_block_number(tag: &str) => "eth_getUncleCountByBlockNumber";
    fn eth_get_code(address: &str, tag: &str) => "eth_getCode";
    /// Signs `message` with the given unlocked account.
    fn eth_sign(account: &str, message: &str) => "eth_sign";
    fn eth_send_transaction(transaction: &Value) => "eth_sendTransaction";
    fn eth_send_raw_transaction(data: &str) => "eth_sendRawTransaction";
    /// Executes a message call without creating a transaction.
    fn eth_call(transaction: &Value, tag: &str) => "eth_call";
    fn eth_estimate_gas(transaction: &Value, tag: &str) => "eth_estimateGas";
    /// Block by hash; `full` returns whole transactions instead of hashes.
    fn eth_get_block_by_hash(hash: &str, full: bool) => "eth_getBlockByHash";
    fn eth_get_block_by_number(tag: &str, full: bool) => "eth_getBlockByNumber";
    fn eth_get_transaction_by_hash(hash: &str) => "eth_getTransactionByHash";
    fn eth_get_transaction_by_block_hash_and_index(hash: &str, index: &str) => "eth_getTransactionByBlockHashAndIndex";
    fn eth_get_transaction_by_block_number_and_index(tag: &str, index: &str) => "eth_getTransactionByBlockNumberAndIndex";
    /// Receipt of a mined transaction; `null` while pending.
    fn eth_get_transaction_receipt(hash: &str) => "eth_getTransactionReceipt";
    fn eth_get_uncle_by_block_hash_and_index(hash: &str, index: &str) => "eth_getUncleByBlockHashAndIndex";
    fn eth_get_uncle_by_block_number_and_index(tag: &str, index: &str) => "eth_getUncleByBlockNumberAndIndex";
    fn eth_get_compilers() => "eth_getCompilers";
    fn eth_compile_solidity(code: &str) => "eth_compileSolidity";
    fn eth_compile_lll(code: &str) => "eth_compileLLL";
    fn eth_compile_serpent(code: &str) => "eth_compileSerpent";
    /// Installs a log filter; poll it with `eth_get_filter_changes`.
    fn eth_new_filter(options: &Value) => "eth_newFilter";
    fn eth_new_block_filter() => "eth_newBlockFilter";
    fn eth_new_pending_transaction_filter() => "eth_newPendingTransactionFilter";
    fn eth_uninstall_filter(id: &str) => "eth_uninstallFilter";
    fn eth_get_filter_changes(id: &str) => "eth_getFilterChanges";
    fn eth_get_filter_logs(id: &str) => "eth_getFilterLogs";
    fn eth_get_logs(options: &Value) => "eth_getLogs";
    /// Current block hash, seed hash and boundary target.
    fn eth_get_work() => "eth_getWork";
    fn eth_submit_work(nonce: &str, pow_hash: &str, mix_digest: &str) => "eth_submitWork";
    fn eth_submit_hashrate(hashrate: &str, id: &str) => "eth_submitHashrate";

    fn shh_version() => "shh_version";
    fn shh_post(message: &Value) => "shh_post";
    fn shh_new_identity() => "shh_newIdentity";
    fn shh_has_identity(identity: &str) => "shh_hasIdentity";
    fn shh_new_group() => "shh_newGroup";
    fn shh_add_to_group(identity: &str) => "shh_addToGroup";
    fn shh_new_filter(options: &Value) => "shh_newFilter";
    fn shh_uninstall_filter(id: &str) => "shh_uninstallFilter";
    fn shh_get_filter_changes(id: &str) => "shh_getFilterChanges";
    /// All messages matching a filter, not just new ones.
    fn shh_get_messages(id: &str) => "shh_getMessages";
}
