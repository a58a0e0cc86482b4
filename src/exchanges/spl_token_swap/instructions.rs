//! Pool creation instruction for the token swap program.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use super::parser::{Fees, SwapCurve, CURVE_CONSTANT_PRODUCT};

/// SwapInstruction::Initialize tag.
pub const INITIALIZE_INSTRUCTION_TAG: u8 = 0;

/// Accounts of a pool about to be initialized.
#[derive(Debug, Clone, Copy)]
pub struct InitializeAccounts {
    pub swap: Pubkey,
    pub authority: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub pool_mint: Pubkey,
    pub fee_account: Pubkey,
    /// Receives the initial pool tokens.
    pub destination: Pubkey,
}

/// Fees with only a trade fee set; owner, withdraw and host fees are zero.
pub fn trade_fee_only(numerator: u64, denominator: u64) -> Fees {
    Fees {
        trade_fee_numerator: numerator,
        trade_fee_denominator: denominator,
        owner_trade_fee_numerator: 0,
        owner_trade_fee_denominator: 1,
        owner_withdraw_fee_numerator: 0,
        owner_withdraw_fee_denominator: 1,
        host_fee_numerator: 0,
        host_fee_denominator: 1,
    }
}

/// Initialize a constant-product pool.
pub fn initialize(program_id: &Pubkey, accounts: &InitializeAccounts, fees: &Fees) -> Instruction {
    let curve = SwapCurve {
        curve_type: CURVE_CONSTANT_PRODUCT,
        curve_parameters: [0; 32],
    };

    let mut data = Vec::with_capacity(1 + std::mem::size_of::<Fees>() + std::mem::size_of::<SwapCurve>());
    data.push(INITIALIZE_INSTRUCTION_TAG);
    data.extend_from_slice(bytemuck::bytes_of(fees));
    data.extend_from_slice(bytemuck::bytes_of(&curve));

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.swap, false),
            AccountMeta::new_readonly(accounts.authority, false),
            AccountMeta::new_readonly(accounts.vault_a, false),
            AccountMeta::new_readonly(accounts.vault_b, false),
            AccountMeta::new(accounts.pool_mint, false),
            AccountMeta::new_readonly(accounts.fee_account, false),
            AccountMeta::new(accounts.destination, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data,
    }
}
