use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, now};

/// One consistent read of the exchange pool.
///
/// Every field is read at `block_number`, so values derived from different
/// fields never mix state from two blocks. A snapshot is advisory: it is stale
/// as soon as any state-changing transaction against the pool is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub block_number: u64,
    pub native_reserve: U256,
    pub token_reserve: U256,
    pub lp_total_supply: U256,
    pub fetched_at: Timestamp,
}

impl PoolSnapshot {
    pub fn new(
        block_number: u64,
        native_reserve: U256,
        token_reserve: U256,
        lp_total_supply: U256,
    ) -> Self {
        Self {
            block_number,
            native_reserve,
            token_reserve,
            lp_total_supply,
            fetched_at: now(),
        }
    }

    /// The pool has never been seeded with tokens
    pub fn is_empty(&self) -> bool {
        self.token_reserve.is_zero()
    }

    /// Reserves ordered (input, output) for a swap direction
    pub fn reserves_for(&self, direction: SwapDirection) -> (U256, U256) {
        match direction {
            SwapDirection::NativeToToken => (self.native_reserve, self.token_reserve),
            SwapDirection::TokenToNative => (self.token_reserve, self.native_reserve),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwapDirection {
    NativeToToken,
    TokenToNative,
}

impl std::fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapDirection::NativeToToken => write!(f, "native->token"),
            SwapDirection::TokenToNative => write!(f, "token->native"),
        }
    }
}
