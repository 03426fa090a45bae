use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    client::ReadProvider,
    exchange::contract::ExchangeContract,
    types::{BlockTag, DexError, PoolSnapshot, Result},
    utils::config::SyncConfig,
};

/// Reads pool reserves and LP supply as one block-pinned snapshot
pub struct PoolStateFetcher {
    provider: Arc<dyn ReadProvider>,
    exchange: ExchangeContract,
    config: SyncConfig,
}

impl PoolStateFetcher {
    pub fn new(provider: Arc<dyn ReadProvider>, exchange: ExchangeContract, config: SyncConfig) -> Self {
        Self {
            provider,
            exchange,
            config,
        }
    }

    /// One snapshot: the block number is read first and every value after it
    /// is pinned to that block, so reserves and supply agree with each other.
    pub async fn fetch_snapshot(&self) -> Result<PoolSnapshot> {
        let block_number = self.provider.block_number().await?;
        let block = BlockTag::Number(block_number);

        let (native_reserve, token_reserve, lp_total_supply) = futures::try_join!(
            self.exchange.native_reserve(block),
            self.exchange.token_reserve(block),
            self.exchange.lp_total_supply(block),
        )?;

        debug!(
            "Snapshot at block {}: native={} token={} lp={}",
            block_number, native_reserve, token_reserve, lp_total_supply
        );
        Ok(PoolSnapshot::new(
            block_number,
            native_reserve,
            token_reserve,
            lp_total_supply,
        ))
    }

    pub async fn fetch_with_retry(&self) -> Result<PoolSnapshot> {
        let max_retries = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..max_retries {
            debug!("Snapshot attempt {}/{}", attempt + 1, max_retries);

            match self.fetch_snapshot().await {
                Ok(snapshot) => {
                    if attempt > 0 {
                        info!("Fetched pool snapshot on attempt {}", attempt + 1);
                    }
                    return Ok(snapshot);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!("Snapshot attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);

                    if attempt + 1 < max_retries {
                        let delay = self.config.retry_delay();
                        debug!("Retrying in {:?}...", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        error!("All {} snapshot attempts exhausted", max_retries);
        Err(DexError::Sync(format!(
            "Failed to read pool {} after {} attempts: {}",
            self.exchange.address(),
            max_retries,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}
