use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    instruction::{AccountMeta, Instruction},
    program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::state::{Account as TokenAccount, AccountState, Mint};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::PoolConfig;
use crate::exchanges::account_source::AccountSource;
use crate::exchanges::types::{PoolKind, PoolState, SwapRequest};
use crate::exchanges::PoolAdapter;
use crate::shared::errors::PoolError;
use super::parser::{DecodedSwap, SplTokenSwapParser, CURVE_CONSTANT_PRODUCT};

/// SwapInstruction::Swap tag.
const SWAP_INSTRUCTION_TAG: u8 = 1;

pub struct SplTokenSwapAdapter {
    source: Arc<dyn AccountSource>,
    program_id: Pubkey,
    swap: Pubkey,
    config: PoolConfig,
}

impl SplTokenSwapAdapter {
    pub fn new(config: PoolConfig, source: Arc<dyn AccountSource>) -> Result<Self, crate::shared::errors::ConfigError> {
        Ok(Self {
            program_id: config.program_id()?,
            swap: config.swap()?,
            source,
            config,
        })
    }

    async fn fetch_swap_account(&self) -> Result<Account, PoolError> {
        info!("Fetching SPL Token Swap account {}", self.swap);

        let account = self
            .source
            .get_account(&self.swap)
            .await?
            .ok_or(PoolError::AccountNotFound(self.swap))?;

        if account.owner != self.program_id {
            error!("❌ Invalid swap owner. Expected: {}, Got: {}", self.program_id, account.owner);
            return Err(PoolError::InvalidOwner {
                account: self.swap,
                expected: self.program_id,
                actual: account.owner,
            });
        }

        debug!("Fetched {} bytes for swap {}", account.data.len(), self.swap);
        Ok(account)
    }

    fn derive_authority(&self, bump_seed: u8) -> Result<Pubkey, PoolError> {
        Pubkey::create_program_address(&[self.swap.as_ref(), &[bump_seed]], &self.program_id)
            .map_err(|_| PoolError::InvalidAuthority(self.swap))
    }

    /// Compare an optional configured address against the on-chain one.
    fn check_configured(
        field: &'static str,
        configured: Option<Pubkey>,
        actual: Pubkey,
    ) -> Result<(), PoolError> {
        match configured {
            Some(configured) if configured != actual => Err(PoolError::ConfigMismatch {
                field,
                configured,
                actual,
            }),
            _ => Ok(()),
        }
    }

    fn check_against_config(&self, decoded: &DecodedSwap, authority: Pubkey) -> Result<(), PoolError> {
        let addr = |field: &'static str, value: &Option<String>| -> Result<Option<Pubkey>, PoolError> {
            match value {
                None => Ok(None),
                Some(s) => s.parse().map(Some).map_err(|_| PoolError::InvalidPoolData {
                    account: self.swap,
                    reason: format!("configured {field} is not a valid address: {s}"),
                }),
            }
        };
        Self::check_configured("authority", addr("authority", &self.config.authority)?, authority)?;
        Self::check_configured("vaultA", addr("vaultA", &self.config.vault_a)?, decoded.vault_a)?;
        Self::check_configured("vaultB", addr("vaultB", &self.config.vault_b)?, decoded.vault_b)?;
        Self::check_configured("mintA", addr("mintA", &self.config.mint_a)?, decoded.mint_a)?;
        Self::check_configured("mintB", addr("mintB", &self.config.mint_b)?, decoded.mint_b)?;
        Self::check_configured("poolMint", addr("poolMint", &self.config.pool_mint)?, decoded.pool_mint)?;
        Self::check_configured("feeAccount", addr("feeAccount", &self.config.fee_account)?, decoded.fee_account)?;
        Ok(())
    }

    fn unpack_token_account(&self, key: &Pubkey, account: Option<Account>) -> Result<TokenAccount, PoolError> {
        let account = account.ok_or(PoolError::AccountNotFound(*key))?;
        if account.owner != spl_token::id() {
            return Err(PoolError::InvalidOwner {
                account: *key,
                expected: spl_token::id(),
                actual: account.owner,
            });
        }
        let token = TokenAccount::unpack(&account.data).map_err(|e| PoolError::InvalidPoolData {
            account: *key,
            reason: format!("token account: {e}"),
        })?;
        if token.state != AccountState::Initialized {
            return Err(PoolError::InvalidPoolData {
                account: *key,
                reason: format!("token account state {:?}", token.state),
            });
        }
        Ok(token)
    }

    fn unpack_mint(&self, key: &Pubkey, account: Option<Account>) -> Result<Mint, PoolError> {
        let account = account.ok_or(PoolError::AccountNotFound(*key))?;
        Mint::unpack(&account.data).map_err(|e| PoolError::InvalidPoolData {
            account: *key,
            reason: format!("mint: {e}"),
        })
    }

    fn check_vault(
        vault_key: &Pubkey,
        vault: &TokenAccount,
        authority: &Pubkey,
        expected_mint: &Pubkey,
    ) -> Result<(), PoolError> {
        if vault.owner != *authority {
            return Err(PoolError::VaultOwnerMismatch {
                vault: *vault_key,
                owner: vault.owner,
                authority: *authority,
            });
        }
        if vault.mint != *expected_mint {
            return Err(PoolError::VaultMintMismatch {
                vault: *vault_key,
                expected: *expected_mint,
                actual: vault.mint,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PoolAdapter for SplTokenSwapAdapter {
    fn kind(&self) -> PoolKind {
        PoolKind::SplTokenSwap
    }

    async fn load_state(&self) -> Result<PoolState, PoolError> {
        let account = self.fetch_swap_account().await?;
        let decoded = SplTokenSwapParser::parse_swap_account(&self.swap, &account.data)?;

        if !decoded.is_initialized {
            return Err(PoolError::Uninitialized(self.swap));
        }
        if decoded.curve_type != CURVE_CONSTANT_PRODUCT {
            return Err(PoolError::UnsupportedCurve {
                swap: self.swap,
                curve_type: decoded.curve_type,
            });
        }

        let authority = self.derive_authority(decoded.bump_seed)?;
        self.check_against_config(&decoded, authority)?;

        let keys = [
            decoded.vault_a,
            decoded.vault_b,
            decoded.fee_account,
            decoded.mint_a,
            decoded.mint_b,
        ];
        let mut fetched = self.source.get_multiple_accounts(&keys).await?.into_iter();
        let mut next = || fetched.next().flatten();

        let vault_a = self.unpack_token_account(&decoded.vault_a, next())?;
        let vault_b = self.unpack_token_account(&decoded.vault_b, next())?;
        let fee_account = self.unpack_token_account(&decoded.fee_account, next())?;
        let mint_a = self.unpack_mint(&decoded.mint_a, next())?;
        let mint_b = self.unpack_mint(&decoded.mint_b, next())?;

        Self::check_vault(&decoded.vault_a, &vault_a, &authority, &decoded.mint_a)?;
        Self::check_vault(&decoded.vault_b, &vault_b, &authority, &decoded.mint_b)?;

        if fee_account.mint != decoded.pool_mint {
            return Err(PoolError::FeeAccountMismatch {
                fee_account: decoded.fee_account,
                pool_mint: decoded.pool_mint,
                actual: fee_account.mint,
            });
        }

        let fee_bps = decoded.fees.total_fee_bps();
        info!(
            "💰 Swap {}: reserves {} ↔ {}, decimals {}/{}, fee {} bps",
            self.swap, vault_a.amount, vault_b.amount, mint_a.decimals, mint_b.decimals, fee_bps
        );

        Ok(PoolState {
            kind: self.kind(),
            program_id: self.program_id,
            swap: self.swap,
            authority,
            vault_a: decoded.vault_a,
            vault_b: decoded.vault_b,
            mint_a: decoded.mint_a,
            mint_b: decoded.mint_b,
            decimals_a: mint_a.decimals,
            decimals_b: mint_b.decimals,
            reserve_a: vault_a.amount,
            reserve_b: vault_b.amount,
            fee_bps,
            fees: decoded.fees,
            pool_mint: decoded.pool_mint,
            fee_account: decoded.fee_account,
        })
    }

    fn build_swap_instruction(&self, state: &PoolState, request: &SwapRequest) -> Result<Instruction, PoolError> {
        let (pool_source, pool_destination) = if request.source_mint == state.mint_a {
            (state.vault_a, state.vault_b)
        } else if request.source_mint == state.mint_b {
            (state.vault_b, state.vault_a)
        } else {
            return Err(PoolError::MintNotInPool {
                swap: state.swap,
                mint: request.source_mint,
            });
        };

        let mut data = Vec::with_capacity(17);
        data.push(SWAP_INSTRUCTION_TAG);
        data.extend_from_slice(&request.amount_in.to_le_bytes());
        data.extend_from_slice(&request.min_out.to_le_bytes());

        let accounts = vec![
            AccountMeta::new_readonly(state.swap, false),
            AccountMeta::new_readonly(state.authority, false),
            AccountMeta::new_readonly(request.user, true),
            AccountMeta::new(request.user_source_ata, false),
            AccountMeta::new(pool_source, false),
            AccountMeta::new(pool_destination, false),
            AccountMeta::new(request.user_dest_ata, false),
            AccountMeta::new(state.pool_mint, false),
            AccountMeta::new(state.fee_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ];

        Ok(Instruction {
            program_id: state.program_id,
            accounts,
            data,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::exchanges::account_source::StaticAccounts;
    use crate::exchanges::spl_token_swap::parser::{Fees, SwapCurve, SwapV1};
    use crate::exchanges::types::SPL_TOKEN_SWAP_PROGRAM_ID;
    use spl_token::solana_program::program_option::COption;

    /// A consistent on-chain pool staged in memory.
    pub(crate) struct Fixture {
        pub accounts: StaticAccounts,
        pub program_id: Pubkey,
        pub swap: Pubkey,
        pub authority: Pubkey,
        pub vault_a: Pubkey,
        pub vault_b: Pubkey,
        pub mint_a: Pubkey,
        pub mint_b: Pubkey,
        pub pool_mint: Pubkey,
        pub fee_account: Pubkey,
    }

    pub(crate) fn token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Account {
        let state = TokenAccount {
            mint,
            owner,
            amount,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(state, &mut data).unwrap();
        Account {
            lamports: 2_039_280,
            data,
            owner: spl_token::id(),
            executable: false,
            rent_epoch: 0,
        }
    }

    pub(crate) fn mint_account(decimals: u8) -> Account {
        let state = Mint {
            mint_authority: COption::None,
            supply: 0,
            decimals,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(state, &mut data).unwrap();
        Account {
            lamports: 1_461_600,
            data,
            owner: spl_token::id(),
            executable: false,
            rent_epoch: 0,
        }
    }

    pub(crate) fn swap_layout(f: &Fixture, bump_seed: u8, trade_fee_numerator: u64) -> SwapV1 {
        SwapV1 {
            is_initialized: 1,
            bump_seed,
            token_program_id: spl_token::id().to_bytes(),
            token_a: f.vault_a.to_bytes(),
            token_b: f.vault_b.to_bytes(),
            pool_mint: f.pool_mint.to_bytes(),
            token_a_mint: f.mint_a.to_bytes(),
            token_b_mint: f.mint_b.to_bytes(),
            pool_fee_account: f.fee_account.to_bytes(),
            fees: Fees {
                trade_fee_numerator,
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

    pub(crate) fn put_swap(f: &mut Fixture, layout: &SwapV1) {
        f.accounts.insert(
            f.swap,
            Account {
                lamports: 3_145_920,
                data: SplTokenSwapParser::pack_swap_account(layout),
                owner: f.program_id,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    /// Pool with the given reserves, 6-decimal mints and a 25/10000 trade fee.
    pub(crate) fn fixture(reserve_a: u64, reserve_b: u64) -> Fixture {
        let program_id: Pubkey = SPL_TOKEN_SWAP_PROGRAM_ID.parse().unwrap();
        let swap = Pubkey::new_unique();
        let (authority, bump_seed) = Pubkey::find_program_address(&[swap.as_ref()], &program_id);

        let mut f = Fixture {
            accounts: StaticAccounts::new(),
            program_id,
            swap,
            authority,
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            mint_a: Pubkey::new_unique(),
            mint_b: Pubkey::new_unique(),
            pool_mint: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
        };

        let layout = swap_layout(&f, bump_seed, 25);
        put_swap(&mut f, &layout);
        f.accounts.insert(f.vault_a, token_account(f.mint_a, authority, reserve_a));
        f.accounts.insert(f.vault_b, token_account(f.mint_b, authority, reserve_b));
        f.accounts.insert(f.fee_account, token_account(f.pool_mint, Pubkey::new_unique(), 0));
        f.accounts.insert(f.mint_a, mint_account(6));
        f.accounts.insert(f.mint_b, mint_account(6));
        f
    }

    pub(crate) fn config_for(f: &Fixture) -> PoolConfig {
        PoolConfig {
            kind: "spl-token-swap".to_string(),
            program_id: f.program_id.to_string(),
            swap: f.swap.to_string(),
            authority: None,
            vault_a: None,
            vault_b: None,
            mint_a: None,
            mint_b: None,
            pool_mint: None,
            fee_account: None,
        }
    }

    fn adapter(f: &Fixture) -> SplTokenSwapAdapter {
        SplTokenSwapAdapter::new(config_for(f), Arc::new(f.accounts.clone())).unwrap()
    }

    fn bump_of(f: &Fixture) -> u8 {
        Pubkey::find_program_address(&[f.swap.as_ref()], &f.program_id).1
    }

    #[tokio::test]
    async fn test_load_state() {
        let f = fixture(1_000_000, 2_000_000);
        let state = adapter(&f).load_state().await.unwrap();

        assert_eq!(state.kind, PoolKind::SplTokenSwap);
        assert_eq!(state.authority, f.authority);
        assert_eq!((state.reserve_a, state.reserve_b), (1_000_000, 2_000_000));
        assert_eq!((state.decimals_a, state.decimals_b), (6, 6));
        assert_eq!(state.mint_a, f.mint_a);
        assert_eq!(state.fee_bps, 25);
        assert_eq!(state.pool_mint, f.pool_mint);
    }

    #[tokio::test]
    async fn test_vault_owner_mismatch_fails() {
        let mut f = fixture(1_000_000, 1_000_000);
        let intruder = Pubkey::new_unique();
        f.accounts.insert(f.vault_b, token_account(f.mint_b, intruder, 1_000_000));

        let err = adapter(&f).load_state().await.unwrap_err();
        match err {
            PoolError::VaultOwnerMismatch { vault, owner, authority } => {
                assert_eq!(vault, f.vault_b);
                assert_eq!(owner, intruder);
                assert_eq!(authority, f.authority);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fee_account_mint_mismatch_fails() {
        let mut f = fixture(1_000_000, 1_000_000);
        f.accounts.insert(f.fee_account, token_account(f.mint_a, Pubkey::new_unique(), 0));

        let err = adapter(&f).load_state().await.unwrap_err();
        assert!(matches!(err, PoolError::FeeAccountMismatch { .. }));
    }

    #[tokio::test]
    async fn test_uninitialized_swap_fails() {
        let mut f = fixture(1_000_000, 1_000_000);
        let mut layout = swap_layout(&f, bump_of(&f), 25);
        layout.is_initialized = 0;
        put_swap(&mut f, &layout);

        let err = adapter(&f).load_state().await.unwrap_err();
        assert!(matches!(err, PoolError::Uninitialized(swap) if swap == f.swap));
    }

    #[tokio::test]
    async fn test_wrong_program_owner_fails() {
        let mut f = fixture(1_000_000, 1_000_000);
        let mut account = f.accounts.remove(&f.swap).unwrap();
        account.owner = Pubkey::new_unique();
        f.accounts.insert(f.swap, account);

        let err = adapter(&f).load_state().await.unwrap_err();
        assert!(matches!(err, PoolError::InvalidOwner { .. }));
    }

    #[tokio::test]
    async fn test_non_constant_product_curve_fails() {
        let mut f = fixture(1_000_000, 1_000_000);
        let mut layout = swap_layout(&f, bump_of(&f), 25);
        layout.swap_curve.curve_type = 1;
        put_swap(&mut f, &layout);

        let err = adapter(&f).load_state().await.unwrap_err();
        assert!(matches!(err, PoolError::UnsupportedCurve { curve_type: 1, .. }));
    }

    #[tokio::test]
    async fn test_missing_vault_fails() {
        let mut f = fixture(1_000_000, 1_000_000);
        f.accounts.remove(&f.vault_a);

        let err = adapter(&f).load_state().await.unwrap_err();
        assert!(matches!(err, PoolError::AccountNotFound(key) if key == f.vault_a));
    }

    #[tokio::test]
    async fn test_configured_address_must_match() {
        let f = fixture(1_000_000, 1_000_000);
        let mut cfg = config_for(&f);
        cfg.mint_a = Some(Pubkey::new_unique().to_string());
        let adapter = SplTokenSwapAdapter::new(cfg, Arc::new(f.accounts.clone())).unwrap();

        let err = adapter.load_state().await.unwrap_err();
        assert!(matches!(err, PoolError::ConfigMismatch { field: "mintA", .. }));

        let mut cfg = config_for(&f);
        cfg.authority = Some(f.authority.to_string());
        cfg.vault_b = Some(f.vault_b.to_string());
        let adapter = SplTokenSwapAdapter::new(cfg, Arc::new(f.accounts.clone())).unwrap();
        assert!(adapter.load_state().await.is_ok());
    }

    #[tokio::test]
    async fn test_build_swap_instruction() {
        let f = fixture(1_000_000, 1_000_000);
        let adapter = adapter(&f);
        let state = adapter.load_state().await.unwrap();

        let user = Pubkey::new_unique();
        let (src, dst) = (Pubkey::new_unique(), Pubkey::new_unique());
        let request = SwapRequest {
            user,
            user_source_ata: src,
            user_dest_ata: dst,
            source_mint: f.mint_b,
            amount_in: 1_000,
            min_out: 990,
        };
        let ix = adapter.build_swap_instruction(&state, &request).unwrap();

        assert_eq!(ix.program_id, f.program_id);
        assert_eq!(ix.data[0], SWAP_INSTRUCTION_TAG);
        assert_eq!(&ix.data[1..9], &1_000u64.to_le_bytes());
        assert_eq!(&ix.data[9..17], &990u64.to_le_bytes());
        assert_eq!(ix.accounts.len(), 10);
        assert!(ix.accounts[2].is_signer);
        assert_eq!(ix.accounts[2].pubkey, user);
        // B -> A: pool receives into vault B, pays from vault A
        assert_eq!(ix.accounts[4].pubkey, f.vault_b);
        assert_eq!(ix.accounts[5].pubkey, f.vault_a);
        assert_eq!(ix.accounts[9].pubkey, spl_token::id());
    }

    #[tokio::test]
    async fn test_build_swap_instruction_rejects_foreign_mint() {
        let f = fixture(1_000_000, 1_000_000);
        let adapter = adapter(&f);
        let state = adapter.load_state().await.unwrap();

        let request = SwapRequest {
            user: Pubkey::new_unique(),
            user_source_ata: Pubkey::new_unique(),
            user_dest_ata: Pubkey::new_unique(),
            source_mint: Pubkey::new_unique(),
            amount_in: 1,
            min_out: 0,
        };
        let err = adapter.build_swap_instruction(&state, &request).unwrap_err();
        assert!(matches!(err, PoolError::MintNotInPool { .. }));
    }
}
