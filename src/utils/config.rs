use std::time::Duration;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{DexError, Result, TokenInfo};
use crate::utils::math::percent_to_bps;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Largest decimals value whose scale factor still fits in 256 bits
const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network settings
    pub network: NetworkConfig,

    /// Exchange contract and pooled tokens
    pub exchange: ExchangeConfig,

    /// Transaction submission settings
    pub execution: ExecutionConfig,

    /// Snapshot read settings
    pub sync: SyncConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub request_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            request_timeout_ms: 10_000,
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Exchange contract plus display metadata for everything it holds.
/// Token names live here, so one build serves any token the contract pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub address: Address,
    pub native: TokenInfo,
    pub token: TokenInfo,
    pub lp_token: TokenInfo,
    pub methods: ExchangeMethods,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            address: Address::ZERO,
            native: TokenInfo::native("ETH", 18).with_name("Ether"),
            token: TokenInfo::new("CD", Address::ZERO, 18).with_name("Crypto Dev Token"),
            lp_token: TokenInfo::native("CDLP", 18).with_name("Crypto Dev LP Token"),
            methods: ExchangeMethods::default(),
        }
    }
}

/// Swap entry points; deployments often name these after the token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeMethods {
    pub eth_to_token: String,
    pub token_to_eth: String,
}

impl Default for ExchangeMethods {
    fn default() -> Self {
        Self {
            eth_to_token: "ethToToken".into(),
            token_to_eth: "tokenToEth".into(),
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Dry run mode (plan and quote, never submit)
    pub dry_run: bool,

    /// Node-managed account used as transaction sender
    pub from: Option<Address>,

    /// Slippage tolerance percentage applied to swap quotes
    pub slippage_tolerance_percent: Decimal,

    /// Optional gas limit; the node estimates when unset
    pub gas_limit: Option<u64>,

    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            from: None,
            slippage_tolerance_percent: dec!(0),
            gas_limit: None,
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_ms: 120_000,
        }
    }
}

impl ExecutionConfig {
    pub fn slippage_tolerance_bps(&self) -> Result<u32> {
        percent_to_bps(self.slippage_tolerance_percent)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

impl SyncConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

impl Config {
    /// Load config from `DEX_CONFIG` (or `config.toml`) layered under
    /// `DEX__SECTION__KEY` environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var("DEX_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::new(path, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("DEX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain RPC_URL is honored for parity with common tooling
            .set_override_option("network.rpc_url", std::env::var("RPC_URL").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse a TOML document directly, without file or environment layers
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DexError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DexError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = &self.network.rpc_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DexError::Config(format!("RPC URL '{}' must be http(s)", url)));
        }

        if self.exchange.address == Address::ZERO {
            return Err(DexError::Config("Exchange address is not set".into()));
        }

        if self.exchange.token.is_native() || self.exchange.token.address == Some(Address::ZERO) {
            return Err(DexError::Config("Token address is not set".into()));
        }

        for token in [&self.exchange.native, &self.exchange.token, &self.exchange.lp_token] {
            if token.decimals > MAX_DECIMALS {
                return Err(DexError::Config(format!(
                    "{} decimals {} exceeds {}",
                    token.symbol, token.decimals, MAX_DECIMALS
                )));
            }
        }

        self.execution
            .slippage_tolerance_bps()
            .map_err(|e| DexError::Config(e.to_string()))?;

        if !self.execution.dry_run && self.execution.from.is_none() {
            return Err(DexError::Config("Sender address required when not in dry-run mode".into()));
        }

        if self.sync.max_retries == 0 {
            return Err(DexError::Config("sync.max_retries must be at least 1".into()));
        }

        Ok(())
    }
}
