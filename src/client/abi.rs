//! Just enough Solidity ABI to call functions with static arguments and read
//! back `uint256` words.

use alloy_primitives::{keccak256, Address, Bytes, U256};

use crate::types::{DexError, Result};

const WORD: usize = 32;

/// Static ABI argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Uint(U256),
    Address(Address),
}

impl Token {
    fn to_word(self) -> [u8; WORD] {
        match self {
            Token::Uint(value) => value.to_be_bytes::<WORD>(),
            Token::Address(address) => address.into_word().0,
        }
    }
}

/// First four bytes of the keccak-256 hash of a canonical signature such as
/// `"balanceOf(address)"`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `signature` applied to `args`
pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = Vec::with_capacity(4 + WORD * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    Bytes::from(data)
}

/// The `index`-th 32-byte word of return data as `uint256`
pub fn decode_uint(data: &[u8], index: usize) -> Result<U256> {
    let start = index * WORD;
    let word = data.get(start..start + WORD).ok_or_else(|| {
        DexError::Parse(format!(
            "return data has {} bytes, word {} needs {}",
            data.len(),
            index,
            start + WORD
        ))
    })?;
    Ok(U256::from_be_slice(word))
}
