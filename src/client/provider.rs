use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::Serialize;

use crate::types::{BlockTag, Result, TransactionReceipt};

/// Transaction or call object in JSON-RPC form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    pub data: Bytes,
}

impl CallRequest {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            from: None,
            to,
            value: None,
            gas: None,
            data,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas.map(U256::from);
        self
    }
}

/// Read access to chain state
#[async_trait]
pub trait ReadProvider: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;
    async fn block_number(&self) -> Result<u64>;
    async fn get_balance(&self, address: Address, block: BlockTag) -> Result<U256>;
    async fn call(&self, request: &CallRequest, block: BlockTag) -> Result<Bytes>;
}

/// Signing identity able to submit transactions and await their receipts
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Submit and return the transaction hash without waiting for inclusion
    async fn send_transaction(&self, request: CallRequest) -> Result<B256>;

    /// Block until the transaction is mined. A failed status is an error.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt>;

    async fn send_and_confirm(&self, request: CallRequest) -> Result<TransactionReceipt> {
        let hash = self.send_transaction(request).await?;
        self.wait_for_receipt(hash).await
    }
}
