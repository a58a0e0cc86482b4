use serde::{Deserialize, Serialize};
use crate::exchanges::compute_budget::DEFAULT_COMPUTE_UNITS;
use crate::math::BPS_DENOMINATOR;
use crate::shared::errors::ArbitrageError;

/// Inputs of one evaluation besides the two pool snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeParams {
    /// Input in UI units of pool A's token A.
    pub amount_in: f64,
    pub spread_threshold_bps: u32,
    pub slippage_bps: u32,
    /// Compute-unit price.
    pub priority_fee_micro_lamports: u64,
    pub compute_units: u32,
    /// Rent for accounts the transaction has to create.
    pub rent_lamports: u64,
    /// Converts the lamport cost into base tokens; no conversion when `None`.
    pub rate_tokens_per_sol: Option<f64>,
}

impl Default for TradeParams {
    fn default() -> Self {
        Self {
            amount_in: 0.0,
            spread_threshold_bps: 0,
            slippage_bps: 0,
            priority_fee_micro_lamports: 0,
            compute_units: DEFAULT_COMPUTE_UNITS,
            rent_lamports: 0,
            rate_tokens_per_sol: None,
        }
    }
}

impl TradeParams {
    pub fn validate(&self) -> Result<(), ArbitrageError> {
        if !self.amount_in.is_finite() || self.amount_in <= 0.0 {
            return Err(ArbitrageError::InvalidParameter(format!(
                "amount_in must be positive, got {}",
                self.amount_in
            )));
        }
        if self.slippage_bps > BPS_DENOMINATOR {
            return Err(ArbitrageError::InvalidParameter(format!(
                "slippage_bps must be at most {}, got {}",
                BPS_DENOMINATOR, self.slippage_bps
            )));
        }
        Ok(())
    }
}

/// Raw integer amounts behind the UI figures of a [`TradeDecision`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAmounts {
    pub amount_in: u64,
    pub expected_out_leg1: u64,
    pub expected_out_leg2: u64,
    pub min_out_leg1: u64,
    pub min_out_leg2: u64,
    pub cost_tokens: u64,
    pub pnl: i128,
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    #[serde(rename = "priceA")]
    pub price_a: f64,
    #[serde(rename = "priceB")]
    pub price_b: f64,
    pub spread_bps: f64,
    pub meets_threshold: bool,
    pub expected_out_leg1: f64,
    pub expected_out_leg2: f64,
    pub min_out_leg1: f64,
    pub min_out_leg2: f64,
    pub lamports_cost: u64,
    pub lamports_cost_tokens_equiv: f64,
    pub pnl_tokens: f64,
    pub trade_allowed: bool,
    /// Why the trade is not allowed; empty when it is.
    pub reasons: Vec<String>,
    pub raw: RawAmounts,
}
