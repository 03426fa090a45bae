use alloy_primitives::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::types::{DexError, Result};

pub const BPS_DENOMINATOR: u32 = 10_000;

/// Convert a percentage ("0.5" = 0.5%) into whole basis points.
/// Sub-basis-point precision is truncated.
pub fn percent_to_bps(percent: Decimal) -> Result<u32> {
    if percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED {
        return Err(DexError::invalid_input(format!(
            "percentage {} must be within 0..=100",
            percent
        )));
    }
    (percent * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u32()
        .ok_or_else(|| DexError::invalid_input(format!("percentage {} out of range", percent)))
}

/// Minimum acceptable output for `expected_output` at `tolerance_bps`
pub fn apply_slippage_tolerance(expected_output: U256, tolerance_bps: u32) -> Result<U256> {
    if tolerance_bps > BPS_DENOMINATOR {
        return Err(DexError::invalid_input(format!(
            "slippage tolerance {}bps exceeds {}bps",
            tolerance_bps, BPS_DENOMINATOR
        )));
    }
    let keep = U256::from(BPS_DENOMINATOR - tolerance_bps);
    let scaled = expected_output
        .checked_mul(keep)
        .ok_or_else(|| DexError::Overflow(format!("{} * {} exceeds 256 bits", expected_output, keep)))?;
    Ok(scaled / U256::from(BPS_DENOMINATOR))
}
