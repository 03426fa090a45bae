//! Proportional amount math for liquidity deposits and withdrawals.
//!
//! All functions are pure and floor-divide in 256-bit integer space, matching
//! the exchange contract's own `uint256` arithmetic.

use alloy_primitives::U256;

use crate::types::{DexError, Result};

/// `floor(a * b / denominator)`; a zero denominator is `InvalidState`
fn mul_div_floor(a: U256, b: U256, denominator: U256, what: &str) -> Result<U256> {
    if denominator.is_zero() {
        return Err(DexError::invalid_state(format!("{} is zero", what)));
    }
    let product = a
        .checked_mul(b)
        .ok_or_else(|| DexError::Overflow(format!("{} * {} exceeds 256 bits", a, b)))?;
    Ok(product / denominator)
}

/// Amount of the other pool asset that must accompany `input_amount` so the
/// deposit keeps the current reserve ratio.
///
/// `input_reserve` must be the reserve of the asset `input_amount` is
/// denominated in. An empty pool (`input_reserve == 0`) has no ratio to keep
/// and fails with `InvalidState`; seed it with a user-chosen pair instead.
pub fn compute_matching_amount(
    input_amount: U256,
    input_reserve: U256,
    output_reserve: U256,
) -> Result<U256> {
    mul_div_floor(input_amount, output_reserve, input_reserve, "input reserve")
}

/// Pro-rata share of both reserves returned for redeeming `lp_amount` shares.
///
/// `total_lp_supply`, `reserve_a` and `reserve_b` must come from the same
/// snapshot, otherwise the two amounts are skewed against each other.
pub fn compute_withdrawal_amounts(
    lp_amount: U256,
    total_lp_supply: U256,
    reserve_a: U256,
    reserve_b: U256,
) -> Result<(U256, U256)> {
    if total_lp_supply.is_zero() {
        return Err(DexError::invalid_state("LP total supply is zero"));
    }
    if lp_amount > total_lp_supply {
        return Err(DexError::invalid_input(format!(
            "LP amount {} exceeds total supply {}",
            lp_amount, total_lp_supply
        )));
    }

    let amount_a = mul_div_floor(reserve_a, lp_amount, total_lp_supply, "LP total supply")?;
    let amount_b = mul_div_floor(reserve_b, lp_amount, total_lp_supply, "LP total supply")?;
    Ok((amount_a, amount_b))
}
