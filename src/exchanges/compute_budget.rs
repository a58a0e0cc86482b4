use solana_sdk::{
    instruction::Instruction,
    compute_budget::ComputeBudgetInstruction,
};

/// Compute units requested for the two-leg transaction.
pub const DEFAULT_COMPUTE_UNITS: u32 = 400_000;

/// Create ComputeBudget instruction to set priority fee
pub fn create_priority_fee_instruction(micro_lamports_per_cu: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(micro_lamports_per_cu)
}

/// Create ComputeBudget instruction to set compute unit limit
pub fn create_compute_unit_limit_instruction(compute_units: u32) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_limit(compute_units)
}

/// Price first, then limit.
pub fn create_compute_budget_instructions(
    compute_units: u32,
    micro_lamports_per_cu: u64,
) -> Vec<Instruction> {
    vec![
        create_priority_fee_instruction(micro_lamports_per_cu),
        create_compute_unit_limit_instruction(compute_units),
    ]
}
