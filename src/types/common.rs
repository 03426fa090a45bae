use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Result;
use crate::utils::units::{format_units, parse_units};

pub type Timestamp = u64;

pub fn now() -> Timestamp {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Block selector for read calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl BlockTag {
    /// JSON-RPC parameter form ("latest" or a hex quantity)
    pub fn to_param(&self) -> String {
        match self {
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Number(n) => format!("{:#x}", n),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_param())
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Number(n) => write!(f, "#{}", n),
        }
    }
}

// ============================================================================
// Token Information
// ============================================================================

/// Token metadata. The native asset is a token without a contract address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    #[serde(default)]
    pub address: Option<Address>,
    pub decimals: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address: Some(address),
            decimals,
            name: None,
        }
    }

    pub fn native(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address: None,
            decimals,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_native(&self) -> bool {
        self.address.is_none()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }

    /// Parse a human decimal amount ("1.5") into base units
    pub fn parse_amount(&self, input: &str) -> Result<U256> {
        parse_units(input, self.decimals)
    }

    /// Render base units as a human decimal amount
    pub fn format_amount(&self, raw_amount: U256) -> String {
        format_units(raw_amount, self.decimals)
    }
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
