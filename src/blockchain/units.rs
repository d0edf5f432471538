// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversions between decimal strings and integer base units.

use alloy::primitives::U256;

/// Decimals of one gwei expressed in wei.
pub const GWEI_DECIMALS: u8 = 9;

/// Decimals of the native coin.
pub const ETH_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places (max {0})")]
    TooPrecise(u8),

    #[error("Amount overflow")]
    Overflow,
}

/// Parse a decimal amount into base units.
///
/// `parse_amount("1.5", 9)` is 1.5 gwei expressed in wei. Fractions longer
/// than `decimals` are rejected rather than rounded.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(UnitsError::InvalidFormat(amount.to_string()));
    }

    let whole = parse_digits(parts[0])?;

    let fraction = match parts.get(1) {
        Some(dec_str) if dec_str.len() > decimals as usize => {
            return Err(UnitsError::TooPrecise(decimals));
        }
        Some(dec_str) => {
            let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
            parse_digits(&padded)?
        }
        None => U256::ZERO,
    };

    let multiplier = U256::from(10u64).pow(U256::from(decimals));
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(UnitsError::Overflow)
}

fn parse_digits(digits: &str) -> Result<U256, UnitsError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidFormat(digits.to_string()));
    }
    U256::from_str_radix(digits, 10).map_err(|_| UnitsError::Overflow)
}

/// Format base units as a human-readable amount, truncated to 6 places.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    let shown = &decimal_str[..decimal_str.len().min(6)];
    let trimmed = shown.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, trimmed)
    }
}
