pub mod contract;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use contract::{ExchangeContract, TokenContract};
pub use workflow::{plan_add_liquidity, quote_withdrawal, ExchangeClient, Outcome};
