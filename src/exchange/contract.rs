use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use tracing::{debug, info};

use crate::client::abi::{decode_uint, encode_call, Token};
use crate::client::{CallRequest, ReadProvider, Signer};
use crate::types::{BlockTag, Result, TransactionReceipt};
use crate::utils::config::ExchangeMethods;

pub const GET_TOKEN_RESERVE: &str = "getTokenReserve()";
pub const TOTAL_SUPPLY: &str = "_totalSupply()";
pub const BALANCE_OF: &str = "balanceOf(address)";
pub const GET_AMOUNT_OF_TOKENS: &str = "getAmountOfTokens(uint256,uint256,uint256)";
pub const ADD_LIQUIDITY: &str = "addLiquidity(uint256)";
pub const REMOVE_LIQUIDITY: &str = "removeLiquidity(uint256)";
pub const APPROVE: &str = "approve(address,uint256)";

async fn call_uint(
    provider: &dyn ReadProvider,
    to: Address,
    data: Bytes,
    block: BlockTag,
) -> Result<U256> {
    let output = provider.call(&CallRequest::new(to, data), block).await?;
    decode_uint(&output, 0)
}

/// Bindings for the AMM exchange contract, which is also the LP token
#[derive(Clone)]
pub struct ExchangeContract {
    address: Address,
    provider: Arc<dyn ReadProvider>,
    methods: ExchangeMethods,
}

impl ExchangeContract {
    pub fn new(address: Address, provider: Arc<dyn ReadProvider>, methods: ExchangeMethods) -> Self {
        Self {
            address,
            provider,
            methods,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn eth_to_token_signature(&self) -> String {
        format!("{}(uint256)", self.methods.eth_to_token)
    }

    fn token_to_eth_signature(&self) -> String {
        format!("{}(uint256,uint256)", self.methods.token_to_eth)
    }

    /// Native asset held by the contract
    pub async fn native_reserve(&self, block: BlockTag) -> Result<U256> {
        self.provider.get_balance(self.address, block).await
    }

    pub async fn token_reserve(&self, block: BlockTag) -> Result<U256> {
        call_uint(
            self.provider.as_ref(),
            self.address,
            encode_call(GET_TOKEN_RESERVE, &[]),
            block,
        )
        .await
    }

    pub async fn lp_total_supply(&self, block: BlockTag) -> Result<U256> {
        call_uint(
            self.provider.as_ref(),
            self.address,
            encode_call(TOTAL_SUPPLY, &[]),
            block,
        )
        .await
    }

    pub async fn lp_balance_of(&self, owner: Address, block: BlockTag) -> Result<U256> {
        call_uint(
            self.provider.as_ref(),
            self.address,
            encode_call(BALANCE_OF, &[Token::Address(owner)]),
            block,
        )
        .await
    }

    /// Output the contract would pay for `amount_in`, priced by its own formula
    pub async fn get_amount_of_tokens(
        &self,
        amount_in: U256,
        input_reserve: U256,
        output_reserve: U256,
        block: BlockTag,
    ) -> Result<U256> {
        let data = encode_call(
            GET_AMOUNT_OF_TOKENS,
            &[
                Token::Uint(amount_in),
                Token::Uint(input_reserve),
                Token::Uint(output_reserve),
            ],
        );
        call_uint(self.provider.as_ref(), self.address, data, block).await
    }

    pub async fn add_liquidity(
        &self,
        signer: &dyn Signer,
        token_amount: U256,
        native_value: U256,
    ) -> Result<TransactionReceipt> {
        info!("addLiquidity: {} tokens with {} native", token_amount, native_value);
        let request = CallRequest::new(
            self.address,
            encode_call(ADD_LIQUIDITY, &[Token::Uint(token_amount)]),
        )
        .with_value(native_value);
        signer.send_and_confirm(request).await
    }

    pub async fn remove_liquidity(
        &self,
        signer: &dyn Signer,
        lp_amount: U256,
    ) -> Result<TransactionReceipt> {
        info!("removeLiquidity: {} LP", lp_amount);
        let request = CallRequest::new(
            self.address,
            encode_call(REMOVE_LIQUIDITY, &[Token::Uint(lp_amount)]),
        );
        signer.send_and_confirm(request).await
    }

    pub async fn eth_to_token(
        &self,
        signer: &dyn Signer,
        min_tokens: U256,
        native_value: U256,
    ) -> Result<TransactionReceipt> {
        let signature = self.eth_to_token_signature();
        info!("{}: {} native for at least {} tokens", signature, native_value, min_tokens);
        let request = CallRequest::new(
            self.address,
            encode_call(&signature, &[Token::Uint(min_tokens)]),
        )
        .with_value(native_value);
        signer.send_and_confirm(request).await
    }

    pub async fn token_to_eth(
        &self,
        signer: &dyn Signer,
        tokens_sold: U256,
        min_native: U256,
    ) -> Result<TransactionReceipt> {
        let signature = self.token_to_eth_signature();
        info!("{}: {} tokens for at least {} native", signature, tokens_sold, min_native);
        let request = CallRequest::new(
            self.address,
            encode_call(&signature, &[Token::Uint(tokens_sold), Token::Uint(min_native)]),
        );
        signer.send_and_confirm(request).await
    }
}

/// Bindings for the pooled ERC-20 token
#[derive(Clone)]
pub struct TokenContract {
    address: Address,
    provider: Arc<dyn ReadProvider>,
}

impl TokenContract {
    pub fn new(address: Address, provider: Arc<dyn ReadProvider>) -> Self {
        Self { address, provider }
    }

    pub async fn balance_of(&self, owner: Address, block: BlockTag) -> Result<U256> {
        call_uint(
            self.provider.as_ref(),
            self.address,
            encode_call(BALANCE_OF, &[Token::Address(owner)]),
            block,
        )
        .await
    }

    /// Grant `spender` an allowance and wait for it to be mined
    pub async fn approve(
        &self,
        signer: &dyn Signer,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        debug!("approve: {} for {}", amount, spender);
        let request = CallRequest::new(
            self.address,
            encode_call(APPROVE, &[Token::Address(spender), Token::Uint(amount)]),
        );
        signer.send_and_confirm(request).await
    }
}
