use anyhow::{Context, Result};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::Message,
    packet::PACKET_DATA_SIZE,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tracing::{info, warn};
use crate::exchanges::compute_budget::create_compute_budget_instructions;

/// Instructions making up one arbitrage attempt, in execution order.
#[derive(Debug, Clone)]
pub struct ArbitrageInstructions {
    /// Account creation that must run before the swaps.
    pub setup: Vec<Instruction>,
    pub leg_a: Instruction,
    pub leg_b: Instruction,
}

pub struct TransactionBuilder {
    pub compute_units: u32,
    pub priority_fee_micro_lamports: u64,
}

impl TransactionBuilder {
    pub fn new(compute_units: u32, priority_fee_micro_lamports: u64) -> Self {
        Self {
            compute_units,
            priority_fee_micro_lamports,
        }
    }

    /// Compute budget, setup, leg A, leg B, all in one message.
    pub fn instructions(&self, plan: ArbitrageInstructions) -> Vec<Instruction> {
        let mut instructions = create_compute_budget_instructions(
            self.compute_units,
            self.priority_fee_micro_lamports,
        );
        instructions.extend(plan.setup);
        instructions.push(plan.leg_a);
        instructions.push(plan.leg_b);
        instructions
    }

    /// Build atomic arbitrage transaction signed by the payer
    pub fn build_arbitrage_transaction(
        &self,
        plan: ArbitrageInstructions,
        payer: &Keypair,
        recent_blockhash: Hash,
    ) -> Result<Transaction> {
        info!("🔨 Building atomic arbitrage transaction");

        let instructions = self.instructions(plan);
        let message = Message::new(&instructions, Some(&payer.pubkey()));
        let mut transaction = Transaction::new_unsigned(message);
        transaction
            .try_sign(&[payer], recent_blockhash)
            .context("sign arbitrage transaction")?;

        info!(
            "🎯 Built atomic transaction with {} instructions ({} CU, {} µlamports/CU)",
            instructions.len(),
            self.compute_units,
            self.priority_fee_micro_lamports
        );

        Ok(transaction)
    }

    /// Validate transaction before execution
    pub fn validate_transaction(&self, transaction: &Transaction) -> Result<()> {
        if transaction.message.instructions.is_empty() {
            return Err(anyhow::anyhow!("Transaction has no instructions"));
        }

        if transaction.message.instructions.len() < 4 {
            warn!("⚠️ Transaction has fewer than 4 instructions (expected: ComputeBudget x2 + 2 swaps)");
        }

        let tx_size = bincode::serialize(transaction)
            .context("serialize transaction")?
            .len();
        if tx_size > PACKET_DATA_SIZE {
            return Err(anyhow::anyhow!(
                "Transaction too large: {} bytes (limit {})",
                tx_size,
                PACKET_DATA_SIZE
            ));
        }

        info!(
            "✅ Transaction validation passed: {} instructions, {} bytes",
            transaction.message.instructions.len(),
            tx_size
        );

        Ok(())
    }
}
