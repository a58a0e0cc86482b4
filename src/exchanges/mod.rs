pub mod account_source;
pub mod compute_budget;
pub mod spl_token_swap;
pub mod transaction_builder;
pub mod types;
pub mod utils;

use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use std::sync::Arc;
use crate::config::PoolConfig;
use crate::exchanges::account_source::AccountSource;
use crate::exchanges::types::{PoolKind, PoolState, SwapRequest};
use crate::shared::errors::{ConfigError, PoolError};

/// One pool program family. New families implement this trait; nothing
/// downstream branches on the kind.
#[async_trait]
pub trait PoolAdapter: Send + Sync {
    fn kind(&self) -> PoolKind;

    /// Fresh, validated snapshot of the pool.
    async fn load_state(&self) -> Result<PoolState, PoolError>;

    /// Swap instruction against a snapshot returned by `load_state`.
    fn build_swap_instruction(&self, state: &PoolState, request: &SwapRequest) -> Result<Instruction, PoolError>;
}

pub fn create_adapter(config: &PoolConfig, source: Arc<dyn AccountSource>) -> Result<Box<dyn PoolAdapter>, ConfigError> {
    match config.pool_kind()? {
        PoolKind::SplTokenSwap => Ok(Box::new(spl_token_swap::SplTokenSwapAdapter::new(config.clone(), source)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::account_source::StaticAccounts;
    use crate::exchanges::spl_token_swap::adapter::tests::{config_for, fixture};

    #[test]
    fn test_unsupported_pool_type() {
        let f = fixture(1, 1);
        let mut cfg = config_for(&f);
        cfg.kind = "custom".to_string();

        let err = create_adapter(&cfg, Arc::new(StaticAccounts::new())).err().unwrap();
        assert!(matches!(err, ConfigError::UnsupportedPoolType(ref t) if t == "custom"));
        assert_eq!(err.to_string(), "Unsupported pool type: custom");
    }

    #[test]
    fn test_create_spl_token_swap_adapter() {
        let f = fixture(1, 1);
        let adapter = create_adapter(&config_for(&f), Arc::new(f.accounts.clone())).unwrap();
        assert_eq!(adapter.kind(), PoolKind::SplTokenSwap);
    }

    #[test]
    fn test_invalid_program_id() {
        let f = fixture(1, 1);
        let mut cfg = config_for(&f);
        cfg.program_id = "not-a-key".to_string();
        let err = create_adapter(&cfg, Arc::new(StaticAccounts::new())).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidAddress { .. }));
    }
}
