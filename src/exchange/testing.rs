//! In-memory chain used by workflow and fetcher tests.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::client::abi::{decode_uint, selector};
use crate::client::{CallRequest, ReadProvider, Signer};
use crate::exchange::contract::{
    ADD_LIQUIDITY, APPROVE, BALANCE_OF, GET_AMOUNT_OF_TOKENS, GET_TOKEN_RESERVE,
    REMOVE_LIQUIDITY, TOTAL_SUPPLY,
};
use crate::types::{BlockTag, DexError, Result, TransactionReceipt};

pub const EXCHANGE: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");
pub const TOKEN: Address = address!("7070707070707070707070707070707070707070");
pub const USER: Address = address!("0505050505050505050505050505050505050505");

/// Fee the fake exchange charges on swaps, in percent
const FEE_PERCENT: u64 = 1;

#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub to: Address,
    pub selector: [u8; 4],
    pub data: Bytes,
    pub value: U256,
}

#[derive(Default)]
struct ChainState {
    block_number: u64,
    native_reserve: U256,
    token_reserve: U256,
    lp_total_supply: U256,
    lp_balances: HashMap<Address, U256>,
    token_balances: HashMap<Address, U256>,
    native_balances: HashMap<Address, U256>,
    read_blocks: Vec<BlockTag>,
    sent: Vec<SentTransaction>,
    revert_selector: Option<[u8; 4]>,
}

/// Answers exchange and token reads from fixed state; every submitted
/// transaction is recorded and mines a new block without touching reserves.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new(block_number: u64) -> Self {
        let chain = Self::default();
        chain.lock().block_number = block_number;
        chain
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn with_pool(self, native_reserve: u128, token_reserve: u128, lp_total_supply: u128) -> Self {
        {
            let mut state = self.lock();
            state.native_reserve = U256::from(native_reserve);
            state.token_reserve = U256::from(token_reserve);
            state.lp_total_supply = U256::from(lp_total_supply);
        }
        self
    }

    pub fn with_account(self, owner: Address, native: u128, token: u128, lp: u128) -> Self {
        {
            let mut state = self.lock();
            state.native_balances.insert(owner, U256::from(native));
            state.token_balances.insert(owner, U256::from(token));
            state.lp_balances.insert(owner, U256::from(lp));
        }
        self
    }

    pub fn revert_on(self, signature: &str) -> Self {
        self.lock().revert_selector = Some(selector(signature));
        self
    }

    pub fn sent(&self) -> Vec<SentTransaction> {
        self.lock().sent.clone()
    }

    pub fn read_blocks(&self) -> Vec<BlockTag> {
        self.lock().read_blocks.clone()
    }
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

fn address_arg(data: &[u8]) -> Result<Address> {
    let word = data
        .get(4 + 12..4 + 32)
        .ok_or_else(|| DexError::Parse("missing address argument".into()))?;
    Ok(Address::from_slice(word))
}

/// Same fee-adjusted constant product as the deployed exchange
pub fn amount_out(amount_in: U256, input_reserve: U256, output_reserve: U256) -> U256 {
    let with_fee = amount_in * U256::from(100 - FEE_PERCENT);
    (with_fee * output_reserve) / (input_reserve * U256::from(100) + with_fee)
}

#[async_trait]
impl ReadProvider for FakeChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(31337)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.lock().block_number)
    }

    async fn get_balance(&self, address: Address, block: BlockTag) -> Result<U256> {
        let mut state = self.lock();
        state.read_blocks.push(block);
        if address == EXCHANGE {
            return Ok(state.native_reserve);
        }
        Ok(state.native_balances.get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, request: &CallRequest, block: BlockTag) -> Result<Bytes> {
        let mut state = self.lock();
        state.read_blocks.push(block);

        let data = &request.data;
        let head: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| DexError::Parse("calldata without selector".into()))?;
        let args = &data[4..];

        let to = request.to;
        let value = if to == EXCHANGE && head == selector(GET_TOKEN_RESERVE) {
            state.token_reserve
        } else if to == EXCHANGE && head == selector(TOTAL_SUPPLY) {
            state.lp_total_supply
        } else if to == EXCHANGE && head == selector(BALANCE_OF) {
            let owner = address_arg(data)?;
            state.lp_balances.get(&owner).copied().unwrap_or_default()
        } else if to == EXCHANGE && head == selector(GET_AMOUNT_OF_TOKENS) {
            let (amount_in, input_reserve, output_reserve) =
                (decode_uint(args, 0)?, decode_uint(args, 1)?, decode_uint(args, 2)?);
            if input_reserve.is_zero() || output_reserve.is_zero() {
                return Err(DexError::Rpc {
                    code: 3,
                    message: "execution reverted: invalid reserves".into(),
                });
            }
            amount_out(amount_in, input_reserve, output_reserve)
        } else if to == TOKEN && head == selector(BALANCE_OF) {
            let owner = address_arg(data)?;
            state.token_balances.get(&owner).copied().unwrap_or_default()
        } else {
            return Err(DexError::Rpc {
                code: -32601,
                message: format!("unknown call {:?} on {}", head, to),
            });
        };
        Ok(word(value))
    }
}

#[async_trait]
impl Signer for FakeChain {
    fn address(&self) -> Address {
        USER
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<B256> {
        let mut state = self.lock();
        let head: [u8; 4] = request
            .data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| DexError::Parse("calldata without selector".into()))?;
        state.sent.push(SentTransaction {
            to: request.to,
            selector: head,
            data: request.data.clone(),
            value: request.value.unwrap_or_default(),
        });
        state.block_number += 1;
        let mut hash = [0u8; 32];
        hash[..4].copy_from_slice(&head);
        hash[31] = state.sent.len() as u8;
        Ok(B256::from(hash))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let state = self.lock();
        if state.revert_selector.is_some_and(|s| hash[..4] == s) {
            return Err(DexError::Reverted { hash });
        }
        Ok(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U256::from(state.block_number)),
            status: Some(U256::from(1)),
            gas_used: Some(U256::from(21_000)),
        })
    }
}

pub fn sent_selector_names(chain: &FakeChain) -> Vec<&'static str> {
    chain
        .sent()
        .iter()
        .map(|tx| {
            [ADD_LIQUIDITY, REMOVE_LIQUIDITY, APPROVE, "ethToToken(uint256)", "tokenToEth(uint256,uint256)"]
                .into_iter()
                .find(|sig| selector(sig) == tx.selector)
                .unwrap_or("unknown")
        })
        .collect()
}
