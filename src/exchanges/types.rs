use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;
use crate::shared::errors::ConfigError;

/// SPL Token Swap program on mainnet and devnet.
pub const SPL_TOKEN_SWAP_PROGRAM_ID: &str = "SwapsVeCiPHMUAtzQWZw7RjsKjgCjhwGZyYuYVmo6ZQo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    #[serde(rename = "spl-token-swap")]
    SplTokenSwap,
}

impl PoolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::SplTokenSwap => "spl-token-swap",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spl-token-swap" => Ok(PoolKind::SplTokenSwap),
            other => Err(ConfigError::UnsupportedPoolType(other.to_string())),
        }
    }
}

/// Fee fractions as stored by the swap program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub owner_trade_fee_numerator: u64,
    pub owner_trade_fee_denominator: u64,
}

impl FeeSchedule {
    /// Total fee charged on swap input, rounded up to whole basis points so
    /// the estimate never undercharges. Zero denominators mean no fee.
    pub fn total_fee_bps(&self) -> u32 {
        fn ceil_bps(numerator: u64, denominator: u64) -> u128 {
            if denominator == 0 {
                return 0;
            }
            let scaled = numerator as u128 * crate::math::BPS_DENOMINATOR as u128;
            scaled.div_ceil(denominator as u128)
        }
        let total = ceil_bps(self.trade_fee_numerator, self.trade_fee_denominator)
            + ceil_bps(self.owner_trade_fee_numerator, self.owner_trade_fee_denominator);
        total.min(crate::math::BPS_DENOMINATOR as u128) as u32
    }
}

// Base58 strings in JSON instead of byte arrays
mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(pubkey)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Snapshot of one pool. Built fresh by `PoolAdapter::load_state`, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub kind: PoolKind,
    #[serde(with = "pubkey_serde")]
    pub program_id: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub swap: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub authority: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub vault_a: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub vault_b: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub mint_a: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub mint_b: Pubkey,
    pub decimals_a: u8,
    pub decimals_b: u8,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub fee_bps: u32,
    pub fees: FeeSchedule,
    #[serde(with = "pubkey_serde")]
    pub pool_mint: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub fee_account: Pubkey,
}

impl PoolState {
    /// The same pool with token A and token B swapped.
    pub fn flipped(&self) -> Self {
        Self {
            vault_a: self.vault_b,
            vault_b: self.vault_a,
            mint_a: self.mint_b,
            mint_b: self.mint_a,
            decimals_a: self.decimals_b,
            decimals_b: self.decimals_a,
            reserve_a: self.reserve_b,
            reserve_b: self.reserve_a,
            ..self.clone()
        }
    }

    pub fn holds_pair(&self, mint_x: &Pubkey, mint_y: &Pubkey) -> bool {
        (self.mint_a == *mint_x && self.mint_b == *mint_y)
            || (self.mint_a == *mint_y && self.mint_b == *mint_x)
    }
}

/// Intent to swap `amount_in` for at least `min_out` on behalf of `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub user: Pubkey,
    pub user_source_ata: Pubkey,
    pub user_dest_ata: Pubkey,
    /// Mint of `user_source_ata`; picks the swap direction.
    pub source_mint: Pubkey,
    pub amount_in: u64,
    pub min_out: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_kind_parse() {
        assert_eq!("spl-token-swap".parse::<PoolKind>().unwrap(), PoolKind::SplTokenSwap);
        let err = "custom".parse::<PoolKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported pool type: custom");
    }

    #[test]
    fn test_fee_schedule_bps() {
        let fees = FeeSchedule {
            trade_fee_numerator: 25,
            trade_fee_denominator: 10_000,
            owner_trade_fee_numerator: 5,
            owner_trade_fee_denominator: 10_000,
        };
        assert_eq!(fees.total_fee_bps(), 30);

        // 0.3% expressed as 3/1000, owner fee disabled with a zero denominator
        let fees = FeeSchedule {
            trade_fee_numerator: 3,
            trade_fee_denominator: 1_000,
            owner_trade_fee_numerator: 0,
            owner_trade_fee_denominator: 0,
        };
        assert_eq!(fees.total_fee_bps(), 30);

        // 1/3 bps rounds up
        let fees = FeeSchedule {
            trade_fee_numerator: 1,
            trade_fee_denominator: 30_000,
            ..FeeSchedule::default()
        };
        assert_eq!(fees.total_fee_bps(), 1);
        assert_eq!(FeeSchedule::default().total_fee_bps(), 0);
    }

    #[test]
    fn test_flipped_swaps_sides() {
        let state = PoolState {
            kind: PoolKind::SplTokenSwap,
            program_id: Pubkey::new_unique(),
            swap: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            mint_a: Pubkey::new_unique(),
            mint_b: Pubkey::new_unique(),
            decimals_a: 9,
            decimals_b: 6,
            reserve_a: 1,
            reserve_b: 2,
            fee_bps: 25,
            fees: FeeSchedule::default(),
            pool_mint: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
        };
        let flipped = state.flipped();
        assert_eq!(flipped.mint_a, state.mint_b);
        assert_eq!(flipped.vault_b, state.vault_a);
        assert_eq!((flipped.reserve_a, flipped.decimals_a), (2, 6));
        assert_eq!(flipped.swap, state.swap);
        assert_eq!(flipped.flipped(), state);
        assert!(flipped.holds_pair(&state.mint_a, &state.mint_b));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["swap"], state.swap.to_string());
        assert_eq!(value["feeAccount"], state.fee_account.to_string());
        assert_eq!(value["fees"]["tradeFeeDenominator"], 0);
        let back: PoolState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }
}
