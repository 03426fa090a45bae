//! Conversions between human decimal strings and base-unit integers.

use alloy_primitives::U256;

use crate::types::{DexError, Result};

fn parse_digits(digits: &str, original: &str) -> Result<U256> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|_| DexError::Overflow(format!("amount '{}' exceeds 256 bits", original)))
}

fn pow10(exponent: usize) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exponent))
        .ok_or_else(|| DexError::Overflow(format!("10^{} exceeds 256 bits", exponent)))
}

fn reject_sign(trimmed: &str) -> Result<()> {
    if trimmed.starts_with('-') {
        return Err(DexError::invalid_input(format!("negative amount '{}'", trimmed)));
    }
    Ok(())
}

/// Parse a non-negative decimal amount into base units.
///
/// An empty string is zero. Fractional digits beyond `decimals` cannot be
/// represented and are rejected rather than truncated.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    reject_sign(trimmed)?;

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(DexError::invalid_input(format!(
            "'{}' is not a decimal amount",
            trimmed
        )));
    }

    let fraction = fraction.trim_end_matches('0');
    let decimals = decimals as usize;
    if fraction.len() > decimals {
        return Err(DexError::invalid_input(format!(
            "'{}' has more than {} decimal places",
            trimmed, decimals
        )));
    }

    let whole_units = parse_digits(whole, trimmed)?
        .checked_mul(pow10(decimals)?)
        .ok_or_else(|| DexError::Overflow(format!("amount '{}' exceeds 256 bits", trimmed)))?;
    let fraction_units = parse_digits(fraction, trimmed)? * pow10(decimals - fraction.len())?;

    whole_units
        .checked_add(fraction_units)
        .ok_or_else(|| DexError::Overflow(format!("amount '{}' exceeds 256 bits", trimmed)))
}

/// Parse an amount already expressed in base units
pub fn parse_base_units(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    reject_sign(trimmed)?;
    if trimmed.contains('.') {
        return Err(DexError::invalid_input(format!(
            "base-unit amount '{}' must be an integer",
            trimmed
        )));
    }
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DexError::invalid_input(format!("'{}' is not an integer", trimmed)));
    }
    parse_digits(trimmed, trimmed)
}

/// Render base units with `decimals` fractional digits, trailing zeros trimmed
pub fn format_units(raw_amount: U256, decimals: u8) -> String {
    let digits = raw_amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
