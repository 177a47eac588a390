//! chainbalance-http: `eth_call` balance reader over HTTP JSON-RPC.
//!
//! [`HttpBalanceClient`] implements [`ChainQueryClient`] by ABI-encoding a
//! `getTokenBalances(address,uint256,address[])` call, sending it as a single
//! `eth_call`, and decoding the returned `uint256[]`.
//!
//! [`ChainQueryClient`]: chainbalance_core::ChainQueryClient

pub mod abi;
pub mod client;
pub mod request;

pub use abi::{BalanceReaderAbi, BALANCE_READER_ABI};
pub use client::{HttpBalanceClient, HttpClientConfig};
pub use request::{CallObject, EthCallParams, EthCallRequest, JsonRpcError, JsonRpcResponse, RpcId};
