//! HTTP JSON-RPC balance client backed by `reqwest`.
//!
//! One `query_balances` call is exactly one `eth_call` round trip. The
//! client does not retry; failed batches are retried by the core's
//! `RetryingBatchCaller`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use chainbalance_core::client::{normalize_batch, zip_records, ChainQueryClient};
use chainbalance_core::{BalanceRecord, ChainCallError, QueryTarget};

use crate::abi::BalanceReaderAbi;
use crate::request::{CallObject, EthCallRequest, JsonRpcResponse};

/// Configuration for `HttpBalanceClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
    /// Block tag the call is executed against.
    pub block: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            block: "latest".into(),
        }
    }
}

/// Reads balances through the balance reader contract over HTTP.
pub struct HttpBalanceClient {
    url: String,
    http: reqwest::Client,
    abi: BalanceReaderAbi,
    config: HttpClientConfig,
    next_id: AtomicU64,
}

impl HttpBalanceClient {
    /// Create a new client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, ChainCallError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainCallError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            abi: BalanceReaderAbi::new()?,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, ChainCallError> {
        Self::new(url, HttpClientConfig::default())
    }

    fn call_request(&self, target: &QueryTarget, addresses: &[Address]) -> EthCallRequest {
        let calldata = self.abi.encode_call(target, addresses);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let call = CallObject {
            to: target.contract.to_checksum(None),
            data: format!("0x{}", hex::encode(calldata)),
        };
        EthCallRequest::new(id, call, self.config.block.as_str())
    }

    async fn send_once(&self, req: &EthCallRequest) -> Result<JsonRpcResponse, ChainCallError> {
        let resp = self
            .http
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainCallError::Http(format!("HTTP {status}: {body}")));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| ChainCallError::Decode(e.to_string()))
    }

    fn map_reqwest(&self, e: reqwest::Error) -> ChainCallError {
        if e.is_timeout() {
            ChainCallError::Timeout {
                ms: self.config.request_timeout.as_millis() as u64,
            }
        } else {
            ChainCallError::Http(e.to_string())
        }
    }
}

/// Turn an `eth_call` response into the returned balances.
pub fn parse_call_response(
    abi: &BalanceReaderAbi,
    resp: JsonRpcResponse,
) -> Result<Vec<U256>, ChainCallError> {
    let result = resp.into_result().map_err(|e| ChainCallError::Rpc {
        code: e.code,
        message: match e.data {
            Some(data) => format!("{} ({data})", e.message),
            None => e.message,
        },
    })?;

    let hex_str = result
        .as_str()
        .ok_or_else(|| ChainCallError::Decode(format!("expected hex string, got {result}")))?;
    let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str))
        .map_err(|e| ChainCallError::Decode(format!("bad hex: {e}")))?;
    abi.decode_balances(&bytes)
}

#[async_trait]
impl ChainQueryClient for HttpBalanceClient {
    async fn query_balances(
        &self,
        target: &QueryTarget,
        addresses: &[String],
    ) -> Result<Vec<BalanceRecord>, ChainCallError> {
        let checksummed = normalize_batch(addresses)?;
        let req = self.call_request(target, &checksummed);
        tracing::trace!(id = %req.id, addresses = addresses.len(), url = %self.url, "eth_call");

        let resp = self.send_once(&req).await?;
        let balances = parse_call_response(&self.abi, resp)?;
        zip_records(addresses, balances)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
