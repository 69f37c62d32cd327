//! Decimal helpers for on-chain integers

use alloy::primitives::U256;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Largest power of ten a `Decimal` can hold
pub const MAX_DECIMALS: u32 = 28;

/// `10^n`, or `None` past `MAX_DECIMALS`
pub fn pow10(n: u32) -> Option<Decimal> {
    match n {
        0 => Some(dec!(1)),
        6 => Some(dec!(1_000_000)),
        18 => Some(dec!(1_000_000_000_000_000_000)),
        _ => (0..n).try_fold(dec!(1), |acc, _| acc.checked_mul(dec!(10))),
    }
}

/// Exact conversion; `None` when the integer does not fit a 96-bit mantissa
pub fn u256_to_decimal(value: U256) -> Option<Decimal> {
    Decimal::from_str(&value.to_string()).ok()
}

/// Raw token amount scaled down by its decimals
pub fn to_token_units(raw: U256, decimals: u32) -> Option<Decimal> {
    u256_to_decimal(raw)?.checked_div(pow10(decimals)?)
}
