use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::provider::{CallRequest, Signer};
use crate::client::rpc::HttpRpcClient;
use crate::types::{DexError, Result, TransactionReceipt};
use crate::utils::config::ExecutionConfig;

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Signer backed by an account the node manages (`eth_sendTransaction`),
/// e.g. an unlocked development account or a node-side keystore.
pub struct RpcSigner {
    client: Arc<HttpRpcClient>,
    from: Address,
    gas_limit: Option<u64>,
    poll_interval: Duration,
    timeout: Duration,
}

impl RpcSigner {
    pub fn new(client: Arc<HttpRpcClient>, from: Address) -> Self {
        let defaults = ExecutionConfig::default();
        Self {
            client,
            from,
            gas_limit: None,
            poll_interval: defaults.receipt_poll_interval(),
            timeout: defaults.receipt_timeout(),
        }
    }

    pub fn from_config(client: Arc<HttpRpcClient>, config: &ExecutionConfig) -> Result<Self> {
        let from = config
            .from
            .ok_or_else(|| DexError::Config("execution.from is required to sign".into()))?;
        let mut signer = Self::new(client, from)
            .with_receipt_timing(config.receipt_poll_interval(), config.receipt_timeout());
        signer.gas_limit = config.gas_limit;
        Ok(signer)
    }

    pub fn with_receipt_timing(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Signer for RpcSigner {
    fn address(&self) -> Address {
        self.from
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<B256> {
        let request = request.with_from(self.from).with_gas(self.gas_limit);
        let hash: B256 = self.client.request("eth_sendTransaction", (&request,)).await?;
        info!("Submitted transaction {} to {}", hash, request.to);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let started = Instant::now();
        loop {
            let receipt: Option<TransactionReceipt> = self
                .client
                .request("eth_getTransactionReceipt", (hash,))
                .await?;

            if let Some(receipt) = receipt {
                if !receipt.succeeded() {
                    warn!("Transaction {} reverted", hash);
                    return Err(DexError::Reverted { hash });
                }
                info!("Transaction {} confirmed", hash);
                return Ok(receipt);
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(DexError::ReceiptTimeout {
                    hash,
                    waited_ms: saturating_millis(waited),
                });
            }
            debug!("Receipt for {} not available yet, polling again", hash);
            sleep(self.poll_interval).await;
        }
    }
}
