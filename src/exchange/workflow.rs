use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

use crate::client::{ReadProvider, Signer};
use crate::exchange::contract::{ExchangeContract, TokenContract};
use crate::liquidity::{compute_matching_amount, compute_withdrawal_amounts};
use crate::sync::PoolStateFetcher;
use crate::types::{
    AccountBalances, AddLiquidityPlan, BlockTag, DexError, PoolSnapshot, Result, SwapDirection,
    SwapQuote, TransactionReceipt, WithdrawalQuote,
};
use crate::utils::config::{Config, SyncConfig};
use crate::utils::math::apply_slippage_tolerance;

/// Decide the deposit pair for `addLiquidity`.
///
/// An empty pool has no ratio yet: the depositor's pair is used as given and
/// `token_amount` is required. Otherwise the token side is derived from the
/// native amount and any `token_amount` passed in is ignored.
pub fn plan_add_liquidity(
    snapshot: &PoolSnapshot,
    native_amount: U256,
    token_amount: Option<U256>,
) -> Result<AddLiquidityPlan> {
    if native_amount.is_zero() {
        return Err(DexError::invalid_input("native amount to deposit is zero"));
    }

    if snapshot.is_empty() {
        let token_amount = token_amount
            .filter(|amount| !amount.is_zero())
            .ok_or_else(|| {
                DexError::invalid_input("pool is empty: a token amount must be chosen for the first deposit")
            })?;
        return Ok(AddLiquidityPlan {
            native_amount,
            token_amount,
            initial: true,
        });
    }

    let matching = compute_matching_amount(
        native_amount,
        snapshot.native_reserve,
        snapshot.token_reserve,
    )?;
    if let Some(requested) = token_amount.filter(|requested| *requested != matching) {
        warn!(
            "Ignoring requested token amount {}; pool ratio requires {}",
            requested, matching
        );
    }
    Ok(AddLiquidityPlan {
        native_amount,
        token_amount: matching,
        initial: false,
    })
}

/// Estimated native and token payout for burning `lp_amount` LP shares
pub fn quote_withdrawal(snapshot: &PoolSnapshot, lp_amount: U256) -> Result<WithdrawalQuote> {
    let (native_amount, token_amount) = compute_withdrawal_amounts(
        lp_amount,
        snapshot.lp_total_supply,
        snapshot.native_reserve,
        snapshot.token_reserve,
    )?;
    Ok(WithdrawalQuote {
        lp_amount,
        native_amount,
        token_amount,
    })
}

/// Result of a state-changing workflow
#[derive(Debug, Clone)]
pub struct Outcome<P> {
    pub plan: P,
    pub receipts: Vec<TransactionReceipt>,
    /// Pool state re-read after the last confirmation
    pub snapshot: PoolSnapshot,
}

/// Liquidity and swap workflows against one exchange/token pair
pub struct ExchangeClient {
    provider: Arc<dyn ReadProvider>,
    exchange: ExchangeContract,
    token: TokenContract,
    fetcher: PoolStateFetcher,
    slippage_bps: u32,
}

impl ExchangeClient {
    pub fn new(
        provider: Arc<dyn ReadProvider>,
        exchange: ExchangeContract,
        token: TokenContract,
        sync: SyncConfig,
        slippage_bps: u32,
    ) -> Self {
        let fetcher = PoolStateFetcher::new(provider.clone(), exchange.clone(), sync);
        Self {
            provider,
            exchange,
            token,
            fetcher,
            slippage_bps,
        }
    }

    pub fn from_config(provider: Arc<dyn ReadProvider>, config: &Config) -> Result<Self> {
        let token_address = config
            .exchange
            .token
            .address
            .ok_or_else(|| DexError::Config("exchange.token.address is required".into()))?;
        let exchange = ExchangeContract::new(
            config.exchange.address,
            provider.clone(),
            config.exchange.methods.clone(),
        );
        let token = TokenContract::new(token_address, provider.clone());
        Ok(Self::new(
            provider,
            exchange,
            token,
            config.sync.clone(),
            config.execution.slippage_tolerance_bps()?,
        ))
    }

    pub async fn snapshot(&self) -> Result<PoolSnapshot> {
        self.fetcher.fetch_with_retry().await
    }

    /// Native, token and LP balances of `owner`, read at one block
    pub async fn balances(&self, owner: Address) -> Result<AccountBalances> {
        let block = BlockTag::Number(self.provider.block_number().await?);
        let (native, token, lp) = futures::try_join!(
            self.provider.get_balance(owner, block),
            self.token.balance_of(owner, block),
            self.exchange.lp_balance_of(owner, block),
        )?;
        Ok(AccountBalances { native, token, lp })
    }

    /// Ask the contract what `amount_in` buys at the snapshot's reserves
    pub async fn quote_swap(
        &self,
        snapshot: &PoolSnapshot,
        direction: SwapDirection,
        amount_in: U256,
    ) -> Result<SwapQuote> {
        if amount_in.is_zero() {
            return Ok(SwapQuote {
                direction,
                amount_in,
                expected_out: U256::ZERO,
                min_out: U256::ZERO,
            });
        }

        let (input_reserve, output_reserve) = snapshot.reserves_for(direction);
        if input_reserve.is_zero() || output_reserve.is_zero() {
            return Err(DexError::invalid_state("pool has no liquidity to swap against"));
        }

        let expected_out = self
            .exchange
            .get_amount_of_tokens(
                amount_in,
                input_reserve,
                output_reserve,
                BlockTag::Number(snapshot.block_number),
            )
            .await?;
        let min_out = apply_slippage_tolerance(expected_out, self.slippage_bps)?;

        Ok(SwapQuote {
            direction,
            amount_in,
            expected_out,
            min_out,
        })
    }

    /// Approve the token side, deposit both sides, then re-read the pool
    pub async fn add_liquidity(
        &self,
        signer: &dyn Signer,
        native_amount: U256,
        token_amount: Option<U256>,
    ) -> Result<Outcome<AddLiquidityPlan>> {
        if native_amount.is_zero() {
            return Err(DexError::invalid_input("native amount to deposit is zero"));
        }

        let snapshot = self.snapshot().await?;
        let plan = plan_add_liquidity(&snapshot, native_amount, token_amount)?;
        info!(
            "Adding liquidity: {} native + {} tokens (initial: {})",
            plan.native_amount, plan.token_amount, plan.initial
        );

        let mut receipts = Vec::with_capacity(2);
        if !plan.token_amount.is_zero() {
            receipts.push(
                self.token
                    .approve(signer, self.exchange.address(), plan.token_amount)
                    .await?,
            );
        }
        receipts.push(
            self.exchange
                .add_liquidity(signer, plan.token_amount, plan.native_amount)
                .await?,
        );

        let snapshot = self.snapshot().await?;
        Ok(Outcome {
            plan,
            receipts,
            snapshot,
        })
    }

    /// Burn LP shares held by the signer
    pub async fn remove_liquidity(
        &self,
        signer: &dyn Signer,
        lp_amount: U256,
    ) -> Result<Outcome<WithdrawalQuote>> {
        if lp_amount.is_zero() {
            return Err(DexError::invalid_input("LP amount to remove is zero"));
        }

        let snapshot = self.snapshot().await?;
        let quote = quote_withdrawal(&snapshot, lp_amount)?;

        let held = self
            .exchange
            .lp_balance_of(signer.address(), BlockTag::Number(snapshot.block_number))
            .await?;
        if lp_amount > held {
            return Err(DexError::invalid_input(format!(
                "LP amount {} exceeds balance {}",
                lp_amount, held
            )));
        }

        info!(
            "Removing {} LP, expecting ~{} native and ~{} tokens",
            quote.lp_amount, quote.native_amount, quote.token_amount
        );
        let receipt = self.exchange.remove_liquidity(signer, lp_amount).await?;

        let snapshot = self.snapshot().await?;
        Ok(Outcome {
            plan: quote,
            receipts: vec![receipt],
            snapshot,
        })
    }

    /// Quote, then swap with the slippage-adjusted minimum as the floor
    pub async fn swap(
        &self,
        signer: &dyn Signer,
        direction: SwapDirection,
        amount_in: U256,
    ) -> Result<Outcome<SwapQuote>> {
        if amount_in.is_zero() {
            return Err(DexError::invalid_input("swap amount is zero"));
        }

        let snapshot = self.snapshot().await?;
        let quote = self.quote_swap(&snapshot, direction, amount_in).await?;
        info!(
            "Swapping {} ({}), expecting {} (min {})",
            quote.amount_in, direction, quote.expected_out, quote.min_out
        );

        let mut receipts = Vec::with_capacity(2);
        match direction {
            SwapDirection::NativeToToken => {
                receipts.push(
                    self.exchange
                        .eth_to_token(signer, quote.min_out, quote.amount_in)
                        .await?,
                );
            }
            SwapDirection::TokenToNative => {
                receipts.push(
                    self.token
                        .approve(signer, self.exchange.address(), quote.amount_in)
                        .await?,
                );
                receipts.push(
                    self.exchange
                        .token_to_eth(signer, quote.amount_in, quote.min_out)
                        .await?,
                );
            }
        }

        let snapshot = self.snapshot().await?;
        Ok(Outcome {
            plan: quote,
            receipts,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::abi::decode_uint;
    use crate::exchange::testing::{amount_out, sent_selector_names, FakeChain, EXCHANGE, TOKEN, USER};
    use crate::utils::config::ExchangeMethods;

    fn u(v: u128) -> U256 {
        U256::from(v)
    }

    fn snapshot(native: u128, token: u128, lp: u128) -> PoolSnapshot {
        PoolSnapshot::new(100, u(native), u(token), u(lp))
    }

    fn client_over(chain: Arc<FakeChain>, slippage_bps: u32) -> ExchangeClient {
        let provider: Arc<dyn ReadProvider> = chain;
        ExchangeClient::new(
            provider.clone(),
            ExchangeContract::new(EXCHANGE, provider.clone(), ExchangeMethods::default()),
            TokenContract::new(TOKEN, provider),
            SyncConfig::default(),
            slippage_bps,
        )
    }

    #[test]
    fn seeded_pool_derives_token_side() {
        let plan = plan_add_liquidity(&snapshot(1000, 2000, 1000), u(50), None).unwrap();
        assert_eq!(plan.token_amount, u(100));
        assert!(!plan.initial);
    }

    #[test]
    fn seeded_pool_overrides_requested_tokens() {
        let plan = plan_add_liquidity(&snapshot(1000, 2000, 1000), u(50), Some(u(1))).unwrap();
        assert_eq!(plan.token_amount, u(100));
    }

    #[test]
    fn empty_pool_keeps_depositor_pair() {
        let plan = plan_add_liquidity(&snapshot(0, 0, 0), u(5), Some(u(17))).unwrap();
        assert_eq!((plan.native_amount, plan.token_amount), (u(5), u(17)));
        assert!(plan.initial);
    }

    #[test]
    fn empty_pool_requires_token_amount() {
        for token in [None, Some(u(0))] {
            let err = plan_add_liquidity(&snapshot(0, 0, 0), u(5), token).unwrap_err();
            assert!(matches!(err, DexError::InvalidInput(_)));
        }
    }

    #[test]
    fn tokens_without_native_reserve_is_invalid_state() {
        let err = plan_add_liquidity(&snapshot(0, 2000, 0), u(5), None).unwrap_err();
        assert!(matches!(err, DexError::InvalidState(_)));
    }

    #[test]
    fn zero_native_deposit_is_rejected() {
        let err = plan_add_liquidity(&snapshot(1000, 2000, 1000), u(0), None).unwrap_err();
        assert!(matches!(err, DexError::InvalidInput(_)));
    }

    #[test]
    fn withdrawal_quote_is_pro_rata() {
        let quote = quote_withdrawal(&snapshot(1000, 4000, 500), u(50)).unwrap();
        assert_eq!((quote.native_amount, quote.token_amount), (u(100), u(400)));
    }

    #[test]
    fn withdrawal_quote_on_empty_supply_is_invalid_state() {
        let err = quote_withdrawal(&snapshot(0, 0, 0), u(1)).unwrap_err();
        assert!(matches!(err, DexError::InvalidState(_)));
    }

    #[tokio::test]
    async fn balances_are_read_at_one_block() {
        let chain = Arc::new(FakeChain::new(50).with_account(USER, 7, 8, 9));
        let client = client_over(chain.clone(), 0);

        let balances = client.balances(USER).await.unwrap();
        assert_eq!((balances.native, balances.token, balances.lp), (u(7), u(8), u(9)));
        assert!(chain.read_blocks().iter().all(|b| *b == BlockTag::Number(50)));
    }

    #[tokio::test]
    async fn swap_quote_orders_reserves_by_direction() {
        let chain = Arc::new(FakeChain::new(1).with_pool(1_000_000, 4_000_000, 1_000_000));
        let client = client_over(chain, 0);
        let snap = client.snapshot().await.unwrap();

        let buy = client
            .quote_swap(&snap, SwapDirection::NativeToToken, u(1000))
            .await
            .unwrap();
        assert_eq!(buy.expected_out, amount_out(u(1000), u(1_000_000), u(4_000_000)));
        assert_eq!(buy.min_out, buy.expected_out);

        let sell = client
            .quote_swap(&snap, SwapDirection::TokenToNative, u(1000))
            .await
            .unwrap();
        assert_eq!(sell.expected_out, amount_out(u(1000), u(4_000_000), u(1_000_000)));
    }

    #[tokio::test]
    async fn swap_quote_applies_slippage() {
        let chain = Arc::new(FakeChain::new(1).with_pool(1_000_000, 4_000_000, 1_000_000));
        let client = client_over(chain, 100);
        let snap = client.snapshot().await.unwrap();

        let quote = client
            .quote_swap(&snap, SwapDirection::NativeToToken, u(10_000))
            .await
            .unwrap();
        assert_eq!(quote.min_out, quote.expected_out * u(9_900) / u(10_000));
    }

    #[tokio::test]
    async fn swap_quote_on_empty_pool_is_invalid_state() {
        let chain = Arc::new(FakeChain::new(1));
        let client = client_over(chain, 0);
        let snap = client.snapshot().await.unwrap();

        let err = client
            .quote_swap(&snap, SwapDirection::NativeToToken, u(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DexError::InvalidState(_)));
    }

    #[tokio::test]
    async fn add_liquidity_approves_then_deposits() {
        let chain = Arc::new(FakeChain::new(10).with_pool(1000, 2000, 1000));
        let client = client_over(chain.clone(), 0);

        let outcome = client.add_liquidity(&*chain, u(50), None).await.unwrap();
        assert_eq!(outcome.plan.token_amount, u(100));
        assert_eq!(outcome.receipts.len(), 2);
        assert_eq!(
            sent_selector_names(&chain),
            vec!["approve(address,uint256)", "addLiquidity(uint256)"]
        );

        let sent = chain.sent();
        assert_eq!(sent[0].to, TOKEN);
        assert_eq!(decode_uint(&sent[0].data[4..], 1).unwrap(), u(100));
        assert_eq!(sent[1].to, EXCHANGE);
        assert_eq!(sent[1].value, u(50));
        assert_eq!(decode_uint(&sent[1].data[4..], 0).unwrap(), u(100));

        // re-read after the two mined blocks
        assert_eq!(outcome.snapshot.block_number, 12);
    }

    #[tokio::test]
    async fn failed_approval_stops_deposit() {
        let chain = Arc::new(
            FakeChain::new(10)
                .with_pool(1000, 2000, 1000)
                .revert_on("approve(address,uint256)"),
        );
        let client = client_over(chain.clone(), 0);

        let err = client.add_liquidity(&*chain, u(50), None).await.unwrap_err();
        assert!(matches!(err, DexError::Reverted { .. }));
        assert_eq!(sent_selector_names(&chain), vec!["approve(address,uint256)"]);
    }

    #[tokio::test]
    async fn remove_liquidity_checks_balance() {
        let chain = Arc::new(
            FakeChain::new(3)
                .with_pool(1000, 4000, 500)
                .with_account(USER, 0, 0, 40),
        );
        let client = client_over(chain.clone(), 0);

        let err = client.remove_liquidity(&*chain, u(50)).await.unwrap_err();
        assert!(matches!(err, DexError::InvalidInput(_)));
        assert!(chain.sent().is_empty());

        let outcome = client.remove_liquidity(&*chain, u(40)).await.unwrap();
        assert_eq!((outcome.plan.native_amount, outcome.plan.token_amount), (u(80), u(320)));
        assert_eq!(sent_selector_names(&chain), vec!["removeLiquidity(uint256)"]);
    }

    #[tokio::test]
    async fn token_sale_needs_allowance_first() {
        let chain = Arc::new(FakeChain::new(1).with_pool(1_000_000, 4_000_000, 1_000_000));
        let client = client_over(chain.clone(), 0);

        let outcome = client
            .swap(&*chain, SwapDirection::TokenToNative, u(1000))
            .await
            .unwrap();
        assert_eq!(
            sent_selector_names(&chain),
            vec!["approve(address,uint256)", "tokenToEth(uint256,uint256)"]
        );

        let sell = &chain.sent()[1];
        assert_eq!(decode_uint(&sell.data[4..], 0).unwrap(), u(1000));
        assert_eq!(decode_uint(&sell.data[4..], 1).unwrap(), outcome.plan.min_out);
        assert!(sell.value.is_zero());
    }

    #[tokio::test]
    async fn native_purchase_sends_value() {
        let chain = Arc::new(FakeChain::new(1).with_pool(1_000_000, 4_000_000, 1_000_000));
        let client = client_over(chain.clone(), 0);

        let outcome = client
            .swap(&*chain, SwapDirection::NativeToToken, u(1000))
            .await
            .unwrap();
        assert_eq!(sent_selector_names(&chain), vec!["ethToToken(uint256)"]);
        let buy = &chain.sent()[0];
        assert_eq!(buy.value, u(1000));
        assert_eq!(decode_uint(&buy.data[4..], 0).unwrap(), outcome.plan.min_out);
    }

    #[tokio::test]
    async fn zero_amount_writes_are_rejected_before_rpc() {
        let chain = Arc::new(FakeChain::new(1).with_pool(1000, 1000, 1000));
        let client = client_over(chain.clone(), 0);

        assert!(client.swap(&*chain, SwapDirection::NativeToToken, U256::ZERO).await.is_err());
        assert!(client.remove_liquidity(&*chain, U256::ZERO).await.is_err());
        let err = client
            .add_liquidity(&*chain, U256::ZERO, Some(u(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, DexError::InvalidInput(_)));
        assert!(chain.sent().is_empty());
        assert!(chain.read_blocks().is_empty());
    }
}
