// src/math.rs
//! Integer swap math and the float helpers used only for display and spread.
//!
//! Raw token amounts are `u64` (the SPL token amount type). Every product is
//! taken in `u128`, so nothing is truncated before the final division.

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use crate::shared::errors::MathError;

/// 100% in basis points.
pub const BPS_DENOMINATOR: u32 = 10_000;

const MICRO_LAMPORTS_PER_LAMPORT: u128 = 1_000_000;

fn check_bps(bps: u32) -> Result<u32, MathError> {
    if bps > BPS_DENOMINATOR {
        return Err(MathError::InvalidBps(bps));
    }
    Ok(bps)
}

/// Convert a UI amount to raw units, truncating toward zero.
///
/// Works on the shortest decimal form of the float, so `0.29` with two
/// decimals is `29` rather than the `28` a plain `0.29 * 100.0` would floor to.
/// Digits beyond `decimals` are dropped; callers that want rounding must
/// round first.
pub fn to_raw(amount_ui: f64, decimals: u8) -> Result<u64, MathError> {
    if !amount_ui.is_finite() || amount_ui < 0.0 {
        return Err(MathError::InvalidAmount(amount_ui.to_string()));
    }
    if amount_ui == 0.0 {
        return Ok(0);
    }

    // f64 Display never switches to exponent notation.
    let repr = amount_ui.to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or(MathError::Overflow)?;
    let whole: u128 = int_part.parse().map_err(|_| MathError::Overflow)?;

    let width = decimals as usize;
    let digits: String = frac_part.chars().take(width).collect();
    let fraction: u128 = if width == 0 {
        0
    } else {
        format!("{digits:0<width$}")
            .parse()
            .map_err(|_| MathError::InvalidAmount(repr.clone()))?
    };

    let raw = whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction))
        .ok_or(MathError::Overflow)?;
    u64::try_from(raw).map_err(|_| MathError::Overflow)
}

/// Raw amount as a human-readable decimal. Display and estimation only.
pub fn ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

/// Signed raw amount, such as a net profit, as a UI decimal.
pub fn ui_signed(amount: i128, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

/// Constant-product output with the fee taken off the input first.
///
/// Both divisions truncate, so the pool never pays out a rounded-up amount.
pub fn swap_out(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_bps: u32,
) -> Result<u64, MathError> {
    let fee_bps = check_bps(fee_bps)?;
    let amount_in_after_fee = amount_in as u128 * (BPS_DENOMINATOR - fee_bps) as u128
        / BPS_DENOMINATOR as u128;

    let denominator = reserve_in as u128 + amount_in_after_fee;
    if denominator == 0 {
        return Err(MathError::NoLiquidity);
    }

    let amount_out = amount_in_after_fee * reserve_out as u128 / denominator;
    u64::try_from(amount_out).map_err(|_| MathError::Overflow)
}

/// Price of token A in units of token B. `f64::INFINITY` when the pool holds
/// no token A: do not trade against such a pool.
pub fn price_from_reserves(reserve_a: u64, reserve_b: u64, decimals_a: u8, decimals_b: u8) -> f64 {
    let a = ui(reserve_a, decimals_a);
    let b = ui(reserve_b, decimals_b);
    if a == 0.0 {
        return f64::INFINITY;
    }
    b / a
}

/// Spread between two prices in basis points of their mean.
pub fn spread_bps(price_a: f64, price_b: f64) -> f64 {
    let mid = (price_a + price_b) / 2.0;
    if mid == 0.0 {
        return 0.0;
    }
    (price_a - price_b).abs() / mid * BPS_DENOMINATOR as f64
}

/// Calculate minimum output amount with slippage protection
pub fn calculate_min_out(amount_out: u64, slippage_bps: u32) -> Result<u64, MathError> {
    let slippage_bps = check_bps(slippage_bps)?;
    let min_out = amount_out as u128 * (BPS_DENOMINATOR - slippage_bps) as u128
        / BPS_DENOMINATOR as u128;
    // never above amount_out
    Ok(min_out as u64)
}

/// Priority fee in lamports for a compute-unit price in micro-lamports.
pub fn calculate_priority_fee(micro_lamports_per_cu: u64, compute_units: u32) -> u64 {
    let fee = micro_lamports_per_cu as u128 * compute_units as u128 / MICRO_LAMPORTS_PER_LAMPORT;
    u64::try_from(fee).unwrap_or(u64::MAX)
}

/// Lamport cost expressed in base tokens. Zero without a positive rate.
pub fn lamports_to_tokens(lamports: u64, rate_tokens_per_sol: Option<f64>) -> f64 {
    match rate_tokens_per_sol {
        Some(rate) if rate > 0.0 && rate.is_finite() => {
            lamports as f64 / LAMPORTS_PER_SOL as f64 * rate
        }
        _ => 0.0,
    }
}
