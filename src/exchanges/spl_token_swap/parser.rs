use bytemuck::{Pod, Zeroable};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;
use crate::exchanges::types::FeeSchedule;
use crate::shared::errors::PoolError;

/// Account size of a versioned SwapV1 account.
pub const SWAP_ACCOUNT_LEN: usize = 324;
pub const SWAP_VERSION_V1: u8 = 1;
pub const CURVE_CONSTANT_PRODUCT: u8 = 0;

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct Fees {
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub owner_trade_fee_numerator: u64,
    pub owner_trade_fee_denominator: u64,
    pub owner_withdraw_fee_numerator: u64,
    pub owner_withdraw_fee_denominator: u64,
    pub host_fee_numerator: u64,
    pub host_fee_denominator: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct SwapCurve {
    pub curve_type: u8,
    pub curve_parameters: [u8; 32],
}

/// On-chain layout after the leading version byte.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct SwapV1 {
    pub is_initialized: u8,
    pub bump_seed: u8,
    pub token_program_id: [u8; 32],
    pub token_a: [u8; 32],
    pub token_b: [u8; 32],
    pub pool_mint: [u8; 32],
    pub token_a_mint: [u8; 32],
    pub token_b_mint: [u8; 32],
    pub pool_fee_account: [u8; 32],
    pub fees: Fees,
    pub swap_curve: SwapCurve,
}

/// Fields of a swap account the adapter works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSwap {
    pub is_initialized: bool,
    pub bump_seed: u8,
    pub token_program_id: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub pool_mint: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub fee_account: Pubkey,
    pub fees: FeeSchedule,
    pub curve_type: u8,
}

pub struct SplTokenSwapParser;

impl SplTokenSwapParser {
    pub fn parse_swap_account(swap: &Pubkey, data: &[u8]) -> Result<DecodedSwap, PoolError> {
        let invalid = |reason: String| PoolError::InvalidPoolData { account: *swap, reason };

        if data.len() != SWAP_ACCOUNT_LEN {
            return Err(invalid(format!(
                "expected {} bytes, got {}",
                SWAP_ACCOUNT_LEN,
                data.len()
            )));
        }
        if data[0] != SWAP_VERSION_V1 {
            return Err(invalid(format!("unknown swap version {}", data[0])));
        }

        let raw: &SwapV1 = bytemuck::try_from_bytes(&data[1..])
            .map_err(|e| invalid(format!("layout: {e}")))?;

        let fees = raw.fees;
        let decoded = DecodedSwap {
            is_initialized: raw.is_initialized == 1,
            bump_seed: raw.bump_seed,
            token_program_id: Pubkey::new_from_array(raw.token_program_id),
            vault_a: Pubkey::new_from_array(raw.token_a),
            vault_b: Pubkey::new_from_array(raw.token_b),
            pool_mint: Pubkey::new_from_array(raw.pool_mint),
            mint_a: Pubkey::new_from_array(raw.token_a_mint),
            mint_b: Pubkey::new_from_array(raw.token_b_mint),
            fee_account: Pubkey::new_from_array(raw.pool_fee_account),
            fees: FeeSchedule {
                trade_fee_numerator: fees.trade_fee_numerator,
                trade_fee_denominator: fees.trade_fee_denominator,
                owner_trade_fee_numerator: fees.owner_trade_fee_numerator,
                owner_trade_fee_denominator: fees.owner_trade_fee_denominator,
            },
            curve_type: raw.swap_curve.curve_type,
        };

        debug!(
            "Parsed swap {}: vaults {} / {}, mints {} / {}, fee {}/{}",
            swap,
            decoded.vault_a,
            decoded.vault_b,
            decoded.mint_a,
            decoded.mint_b,
            decoded.fees.trade_fee_numerator,
            decoded.fees.trade_fee_denominator
        );

        Ok(decoded)
    }

    /// Serialize a swap account, version byte included. Inverse of
    /// [`Self::parse_swap_account`]; used to stage accounts offline.
    pub fn pack_swap_account(swap: &SwapV1) -> Vec<u8> {
        let mut data = Vec::with_capacity(SWAP_ACCOUNT_LEN);
        data.push(SWAP_VERSION_V1);
        data.extend_from_slice(bytemuck::bytes_of(swap));
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SwapV1 {
        SwapV1 {
            is_initialized: 1,
            bump_seed: 254,
            token_program_id: spl_token::id().to_bytes(),
            token_a: [1; 32],
            token_b: [2; 32],
            pool_mint: [3; 32],
            token_a_mint: [4; 32],
            token_b_mint: [5; 32],
            pool_fee_account: [6; 32],
            fees: Fees {
                trade_fee_numerator: 25,
                trade_fee_denominator: 10_000,
                owner_trade_fee_numerator: 0,
                owner_trade_fee_denominator: 1,
                owner_withdraw_fee_numerator: 0,
                owner_withdraw_fee_denominator: 1,
                host_fee_numerator: 0,
                host_fee_denominator: 1,
            },
            swap_curve: SwapCurve {
                curve_type: CURVE_CONSTANT_PRODUCT,
                curve_parameters: [0; 32],
            },
        }
    }

    #[test]
    fn test_layout_size() {
        assert_eq!(std::mem::size_of::<SwapV1>() + 1, SWAP_ACCOUNT_LEN);
    }

    #[test]
    fn test_parse_swap_account() {
        let swap = Pubkey::new_unique();
        let data = SplTokenSwapParser::pack_swap_account(&sample());
        let decoded = SplTokenSwapParser::parse_swap_account(&swap, &data).unwrap();

        assert!(decoded.is_initialized);
        assert_eq!(decoded.bump_seed, 254);
        assert_eq!(decoded.token_program_id, spl_token::id());
        assert_eq!(decoded.vault_a, Pubkey::new_from_array([1; 32]));
        assert_eq!(decoded.mint_b, Pubkey::new_from_array([5; 32]));
        assert_eq!(decoded.fee_account, Pubkey::new_from_array([6; 32]));
        assert_eq!(decoded.fees.total_fee_bps(), 25);
        assert_eq!(decoded.curve_type, CURVE_CONSTANT_PRODUCT);
    }

    #[test]
    fn test_rejects_short_and_unversioned_data() {
        let swap = Pubkey::new_unique();
        let data = SplTokenSwapParser::pack_swap_account(&sample());

        let err = SplTokenSwapParser::parse_swap_account(&swap, &data[..200]).unwrap_err();
        assert!(matches!(err, PoolError::InvalidPoolData { .. }));

        let mut bad_version = data.clone();
        bad_version[0] = 0;
        assert!(SplTokenSwapParser::parse_swap_account(&swap, &bad_version).is_err());
    }
}
