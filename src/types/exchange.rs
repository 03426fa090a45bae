use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::types::SwapDirection;

/// Amounts to deposit in one `addLiquidity` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityPlan {
    pub native_amount: U256,
    pub token_amount: U256,
    /// True when seeding an empty pool, where the depositor picks the ratio
    pub initial: bool,
}

/// Estimated payout for redeeming LP shares.
///
/// The contract decides the real transfer at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalQuote {
    pub lp_amount: U256,
    pub native_amount: U256,
    pub token_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub direction: SwapDirection,
    pub amount_in: U256,
    pub expected_out: U256,
    /// Floor passed to the contract after slippage tolerance
    pub min_out: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    pub native: U256,
    pub token: U256,
    pub lp: U256,
}

/// Subset of an `eth_getTransactionReceipt` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U256>,
    #[serde(default)]
    pub status: Option<U256>,
    #[serde(default)]
    pub gas_used: Option<U256>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status; treat them as successful.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| !status.is_zero())
    }
}
