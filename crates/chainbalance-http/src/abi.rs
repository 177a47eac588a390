//! ABI encoding for the balance reader's `getTokenBalances` view method.

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, U256};
use chainbalance_core::{ChainCallError, QueryTarget};

/// JSON ABI of the balance reader contract.
pub const BALANCE_READER_ABI: &str = r#"[
  {
    "inputs": [
      {"internalType": "address", "name": "_tokenAddr", "type": "address"},
      {"internalType": "uint256", "name": "tokenid", "type": "uint256"},
      {"internalType": "address[]", "name": "addrs", "type": "address[]"}
    ],
    "name": "getTokenBalances",
    "outputs": [{"internalType": "uint256[]", "name": "balances", "type": "uint256[]"}],
    "stateMutability": "view",
    "type": "function"
  }
]"#;

const METHOD: &str = "getTokenBalances";

/// Encoder/decoder for `getTokenBalances(address,uint256,address[])`.
#[derive(Debug, Clone)]
pub struct BalanceReaderAbi {
    function: Function,
    output: DynSolType,
}

impl BalanceReaderAbi {
    /// Load from the built-in [`BALANCE_READER_ABI`].
    pub fn new() -> Result<Self, ChainCallError> {
        Self::from_abi_json(BALANCE_READER_ABI)
    }

    /// Load from a standard Ethereum ABI JSON string containing the method.
    pub fn from_abi_json(abi_json: &str) -> Result<Self, ChainCallError> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| ChainCallError::Other(format!("invalid ABI JSON: {e}")))?;
        let function = abi
            .functions()
            .find(|f| f.name == METHOD)
            .cloned()
            .ok_or_else(|| ChainCallError::Other(format!("function '{METHOD}' not found in ABI")))?;

        let outputs = function
            .outputs
            .iter()
            .map(|p| p.resolve())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ChainCallError::Other(format!("output type: {e}")))?;

        Ok(Self {
            function,
            output: DynSolType::Tuple(outputs),
        })
    }

    /// 4-byte selector followed by the ABI-encoded arguments.
    pub fn encode_call(&self, target: &QueryTarget, addresses: &[Address]) -> Vec<u8> {
        let args = DynSolValue::Tuple(vec![
            DynSolValue::Address(target.token),
            DynSolValue::Uint(target.token_id, 256),
            DynSolValue::Array(addresses.iter().copied().map(DynSolValue::Address).collect()),
        ]);

        let mut calldata = self.function.selector().to_vec();
        calldata.extend_from_slice(&args.abi_encode_params());
        calldata
    }

    /// Decode the `uint256[]` returned by the call.
    pub fn decode_balances(&self, data: &[u8]) -> Result<Vec<U256>, ChainCallError> {
        let decoded = self
            .output
            .abi_decode_params(data)
            .map_err(|e| ChainCallError::Decode(format!("getTokenBalances output: {e}")))?;

        let first = match decoded {
            DynSolValue::Tuple(mut vals) if !vals.is_empty() => vals.swap_remove(0),
            other => other,
        };
        let DynSolValue::Array(items) = first else {
            return Err(ChainCallError::Decode("expected uint256[] output".into()));
        };

        items
            .into_iter()
            .map(|item| match item {
                DynSolValue::Uint(value, _) => Ok(value),
                other => Err(ChainCallError::Decode(format!(
                    "expected uint256, got {other:?}"
                ))),
            })
            .collect()
    }
}
