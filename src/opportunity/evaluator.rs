//! Round-trip decision: token A -> token B on pool A, back to token A on pool B.
//!
//! Pure: both snapshots come from the caller, nothing here touches the network.

use std::borrow::Cow;
use tracing::{debug, info};
use crate::exchanges::types::PoolState;
use crate::math::{
    calculate_min_out, calculate_priority_fee, lamports_to_tokens, price_from_reserves,
    spread_bps, swap_out, to_raw, ui, ui_signed,
};
use crate::opportunity::types::{RawAmounts, TradeDecision, TradeParams};
use crate::shared::errors::{ArbitrageError, MathError};

/// Pool B as seen with pool A's token order.
fn orient<'a>(pool_a: &PoolState, pool_b: &'a PoolState) -> Result<Cow<'a, PoolState>, ArbitrageError> {
    if pool_b.mint_a == pool_a.mint_a && pool_b.mint_b == pool_a.mint_b {
        Ok(Cow::Borrowed(pool_b))
    } else if pool_b.holds_pair(&pool_a.mint_a, &pool_a.mint_b) {
        debug!("Pool {} lists the pair in reverse order, flipping", pool_b.swap);
        Ok(Cow::Owned(pool_b.flipped()))
    } else {
        Err(ArbitrageError::PairMismatch(format!(
            "pool {} trades {}/{}, pool {} trades {}/{}",
            pool_a.swap, pool_a.mint_a, pool_a.mint_b, pool_b.swap, pool_b.mint_a, pool_b.mint_b
        )))
    }
}

fn no_liquidity(pool: &PoolState) -> impl Fn(MathError) -> ArbitrageError + '_ {
    move |err| match err {
        MathError::NoLiquidity => ArbitrageError::NoLiquidity(format!("pool {} has no reserves to swap against", pool.swap)),
        other => ArbitrageError::Math(other),
    }
}

pub fn evaluate(
    pool_a: &PoolState,
    pool_b: &PoolState,
    params: &TradeParams,
) -> Result<TradeDecision, ArbitrageError> {
    params.validate()?;
    let pool_b = orient(pool_a, pool_b)?;

    let price_a = price_from_reserves(pool_a.reserve_a, pool_a.reserve_b, pool_a.decimals_a, pool_a.decimals_b);
    let price_b = price_from_reserves(pool_b.reserve_a, pool_b.reserve_b, pool_b.decimals_a, pool_b.decimals_b);
    for (pool, price) in [(pool_a, price_a), (&*pool_b, price_b)] {
        if !price.is_finite() {
            return Err(ArbitrageError::NoLiquidity(format!(
                "pool {} holds no {}",
                pool.swap, pool.mint_a
            )));
        }
    }
    let spread = spread_bps(price_a, price_b);
    let meets_threshold = spread >= params.spread_threshold_bps as f64;

    let amount_in_raw = to_raw(params.amount_in, pool_a.decimals_a)?;
    if amount_in_raw == 0 {
        return Err(ArbitrageError::InvalidParameter(format!(
            "amount_in {} is below one raw unit at {} decimals",
            params.amount_in, pool_a.decimals_a
        )));
    }

    let out1 = swap_out(amount_in_raw, pool_a.reserve_a, pool_a.reserve_b, pool_a.fee_bps)
        .map_err(no_liquidity(pool_a))?;
    let out2 = swap_out(out1, pool_b.reserve_b, pool_b.reserve_a, pool_b.fee_bps)
        .map_err(no_liquidity(&pool_b))?;

    let min_out1 = calculate_min_out(out1, params.slippage_bps)?;
    let min_out2 = calculate_min_out(out2, params.slippage_bps)?;

    let lamports_cost = params
        .rent_lamports
        .saturating_add(calculate_priority_fee(params.priority_fee_micro_lamports, params.compute_units));
    let cost_tokens = lamports_to_tokens(lamports_cost, params.rate_tokens_per_sol);
    let cost_raw = to_raw(cost_tokens, pool_a.decimals_a)?;

    let pnl_raw = out2 as i128 - amount_in_raw as i128 - cost_raw as i128;
    let trade_allowed = meets_threshold && pnl_raw > 0;

    let mut reasons = Vec::new();
    if !meets_threshold {
        reasons.push(format!(
            "spread {:.2} bps is below threshold {} bps",
            spread, params.spread_threshold_bps
        ));
    }
    if pnl_raw <= 0 {
        reasons.push(format!(
            "round trip returns {} for {} in, net {} after {} cost",
            out2, amount_in_raw, pnl_raw, cost_raw
        ));
    }

    let decision = TradeDecision {
        price_a,
        price_b,
        spread_bps: spread,
        meets_threshold,
        expected_out_leg1: ui(out1, pool_a.decimals_b),
        expected_out_leg2: ui(out2, pool_a.decimals_a),
        min_out_leg1: ui(min_out1, pool_a.decimals_b),
        min_out_leg2: ui(min_out2, pool_a.decimals_a),
        lamports_cost,
        lamports_cost_tokens_equiv: cost_tokens,
        pnl_tokens: ui_signed(pnl_raw, pool_a.decimals_a),
        trade_allowed,
        reasons,
        raw: RawAmounts {
            amount_in: amount_in_raw,
            expected_out_leg1: out1,
            expected_out_leg2: out2,
            min_out_leg1: min_out1,
            min_out_leg2: min_out2,
            cost_tokens: cost_raw,
            pnl: pnl_raw,
        },
    };

    info!(
        "📊 price_a={:.8} price_b={:.8} spread={:.2} bps, pnl={} (allowed: {})",
        decision.price_a, decision.price_b, decision.spread_bps, decision.pnl_tokens, decision.trade_allowed
    );

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::types::{FeeSchedule, PoolKind};
    use solana_sdk::pubkey::Pubkey;

    fn pool(mint_a: Pubkey, mint_b: Pubkey, reserve_a: u64, reserve_b: u64, fee_bps: u32) -> PoolState {
        PoolState {
            kind: PoolKind::SplTokenSwap,
            program_id: Pubkey::new_unique(),
            swap: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            mint_a,
            mint_b,
            decimals_a: 6,
            decimals_b: 6,
            reserve_a,
            reserve_b,
            fee_bps,
            fees: FeeSchedule::default(),
            pool_mint: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
        }
    }

    fn params(amount_in: f64, threshold: u32) -> TradeParams {
        TradeParams {
            amount_in,
            spread_threshold_bps: threshold,
            slippage_bps: 100,
            priority_fee_micro_lamports: 1_000,
            ..TradeParams::default()
        }
    }

    #[test]
    fn test_spread_clears_but_round_trip_loses() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000, 1_000_000, 25);
        let b = pool(ma, mb, 1_050_000, 1_000_000, 25);

        let d = evaluate(&a, &b, &params(1000.0, 50)).unwrap();

        assert_eq!(d.raw.amount_in, 1_000_000_000);
        assert_eq!(d.raw.expected_out_leg1, 998_998);
        assert_eq!(d.raw.expected_out_leg2, 524_079);
        assert_eq!(d.raw.min_out_leg1, 989_008);
        assert_eq!(d.price_a, 1.0);
        assert!((d.spread_bps - 487.8048).abs() < 1e-3, "{}", d.spread_bps);
        assert!(d.meets_threshold);
        assert!(d.raw.pnl < 0);
        assert!(!d.trade_allowed);
        assert_eq!(d.reasons.len(), 1);
        assert_eq!(d.lamports_cost, 400);
        assert_eq!(d.raw.cost_tokens, 0);
    }

    #[test]
    fn test_profitable_round_trip_is_allowed() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000_000_000, 1_100_000_000_000, 25);
        let b = pool(ma, mb, 1_000_000_000_000, 1_000_000_000_000, 25);
        let mut p = params(1000.0, 50);
        p.rent_lamports = 999_600;
        p.rate_tokens_per_sol = Some(1000.0);

        let d = evaluate(&a, &b, &p).unwrap();

        let out1 = swap_out(1_000_000_000, 1_000_000_000_000, 1_100_000_000_000, 25).unwrap();
        let out2 = swap_out(out1, 1_000_000_000_000, 1_000_000_000_000, 25).unwrap();
        assert_eq!(d.raw.expected_out_leg2, out2);
        assert_eq!(d.lamports_cost, 1_000_000);
        assert_eq!(d.lamports_cost_tokens_equiv, 1.0);
        assert_eq!(d.raw.cost_tokens, 1_000_000);
        assert_eq!(d.raw.pnl, out2 as i128 - 1_000_000_000 - 1_000_000);
        assert!(d.raw.pnl > 0);
        assert!(d.trade_allowed);
        assert!(d.reasons.is_empty());
    }

    #[test]
    fn test_below_threshold_blocks_profitable_trade() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000_000_000, 1_100_000_000_000, 25);
        let b = pool(ma, mb, 1_000_000_000_000, 1_000_000_000_000, 25);

        let d = evaluate(&a, &b, &params(1000.0, 2_000)).unwrap();
        assert!(d.raw.pnl > 0);
        assert!(!d.meets_threshold);
        assert!(!d.trade_allowed);
        assert!(d.reasons[0].contains("below threshold"));
    }

    #[test]
    fn test_identical_pools_never_trade() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 5_000_000_000, 5_000_000_000, 30);
        let b = pool(ma, mb, 5_000_000_000, 5_000_000_000, 30);

        let d = evaluate(&a, &b, &params(10.0, 0)).unwrap();
        assert_eq!(d.spread_bps, 0.0);
        assert!(d.meets_threshold);
        assert!(d.raw.expected_out_leg2 < d.raw.amount_in);
        assert!(!d.trade_allowed);
    }

    #[test]
    fn test_reversed_pool_b_is_oriented() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000_000_000, 1_100_000_000_000, 25);
        let b = pool(ma, mb, 1_000_000_000_000, 1_020_000_000_000, 25);
        let b_reversed = pool(mb, ma, 1_020_000_000_000, 1_000_000_000_000, 25);

        let p = params(1000.0, 50);
        let straight = evaluate(&a, &b, &p).unwrap();
        let reversed = evaluate(&a, &b_reversed, &p).unwrap();
        assert_eq!(straight.raw, reversed.raw);
        assert_eq!(straight.price_b, reversed.price_b);
    }

    #[test]
    fn test_pair_mismatch() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000, 1_000_000, 25);
        let b = pool(ma, Pubkey::new_unique(), 1_000_000, 1_000_000, 25);

        let err = evaluate(&a, &b, &params(1.0, 0)).unwrap_err();
        assert!(matches!(err, ArbitrageError::PairMismatch(_)));
    }

    #[test]
    fn test_empty_pool_is_no_liquidity() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000, 1_000_000, 25);
        let empty = pool(ma, mb, 0, 1_000_000, 25);

        assert!(matches!(
            evaluate(&a, &empty, &params(1.0, 0)),
            Err(ArbitrageError::NoLiquidity(_))
        ));
        assert!(matches!(
            evaluate(&empty, &a, &params(1.0, 0)),
            Err(ArbitrageError::NoLiquidity(_))
        ));
    }

    #[test]
    fn test_invalid_params() {
        let (ma, mb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = pool(ma, mb, 1_000_000, 1_000_000, 25);

        assert!(matches!(
            evaluate(&a, &a, &params(0.0, 0)),
            Err(ArbitrageError::InvalidParameter(_))
        ));
        assert!(matches!(
            evaluate(&a, &a, &params(0.0000001, 0)),
            Err(ArbitrageError::InvalidParameter(_))
        ));
        let mut p = params(1.0, 0);
        p.slippage_bps = 20_000;
        assert!(evaluate(&a, &a, &p).is_err());
    }
}
