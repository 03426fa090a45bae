use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256, U64};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::provider::{CallRequest, ReadProvider};
use crate::types::{BlockTag, DexError, Result};

const NO_PARAMS: [u8; 0] = [];

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for DexError {
    fn from(err: RpcErrorObject) -> Self {
        let message = match err.data {
            Some(Value::String(data)) => format!("{} ({})", err.message, data),
            _ => err.message,
        };
        DexError::Rpc {
            code: err.code,
            message,
        }
    }
}

/// JSON-RPC 2.0 client over HTTP
pub struct HttpRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
    health_status: AtomicBool,
}

impl HttpRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        info!("Initializing RPC client with endpoint: {}", endpoint);
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
            health_status: AtomicBool::new(true),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// False after a transport failure, true again after the next good response
    pub fn is_healthy(&self) -> bool {
        self.health_status.load(Ordering::Relaxed)
    }

    fn mark_unhealthy(&self, reason: &str) {
        if self.health_status.swap(false, Ordering::Relaxed) {
            warn!("RPC endpoint {} marked unhealthy: {}", self.endpoint, reason);
        }
    }

    /// Issue one request and decode its `result`. A `null` result is handed to
    /// the decoder as-is, so callers expecting "not found" ask for `Option<R>`.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("RPC request #{} {}", id, method);

        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = match self.http.post(&self.endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                self.mark_unhealthy(&e.to_string());
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.mark_unhealthy(&status.to_string());
            return Err(DexError::Network(format!(
                "HTTP {} from {} for {}",
                status, self.endpoint, method
            )));
        }

        let decoded: RpcResponse = response
            .json()
            .await
            .map_err(|e| DexError::Parse(format!("{} response: {}", method, e)))?;
        self.health_status.store(true, Ordering::Relaxed);

        if let Some(err) = decoded.error {
            debug!("RPC request #{} {} failed: {} {}", id, method, err.code, err.message);
            return Err(err.into());
        }

        serde_json::from_value(decoded.result)
            .map_err(|e| DexError::Parse(format!("{} result: {}", method, e)))
    }
}

#[async_trait]
impl ReadProvider for HttpRpcClient {
    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.request("eth_chainId", NO_PARAMS).await?;
        Ok(id.to::<u64>())
    }

    async fn block_number(&self) -> Result<u64> {
        let number: U64 = self.request("eth_blockNumber", NO_PARAMS).await?;
        Ok(number.to::<u64>())
    }

    async fn get_balance(&self, address: Address, block: BlockTag) -> Result<U256> {
        self.request("eth_getBalance", (address, block)).await
    }

    async fn call(&self, request: &CallRequest, block: BlockTag) -> Result<Bytes> {
        self.request("eth_call", (request, block)).await
    }
}
