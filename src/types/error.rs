use alloy_primitives::B256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("RPC error ({code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction {hash} reverted")]
    Reverted { hash: B256 },

    #[error("Timed out after {waited_ms}ms waiting for receipt of {hash}")]
    ReceiptTimeout { hash: B256, waited_ms: u64 },

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

}

pub type Result<T> = std::result::Result<T, DexError>;

impl DexError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Only transport failures are retried; an RPC error object is an answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, DexError::Network(_))
    }
}

impl From<reqwest::Error> for DexError {
    fn from(err: reqwest::Error) -> Self {
        DexError::Network(err.to_string())
    }
}

impl From<config::ConfigError> for DexError {
    fn from(err: config::ConfigError) -> Self {
        DexError::Config(err.to_string())
    }
}
