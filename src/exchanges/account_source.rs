//! Where adapters get account data from.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{account::Account, pubkey::Pubkey};
use std::collections::HashMap;
use crate::shared::errors::PoolError;

#[async_trait]
pub trait AccountSource: Send + Sync {
    /// `Ok(None)` when the account does not exist.
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, PoolError>;

    /// One entry per requested key, in request order.
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>, PoolError>;
}

#[async_trait]
impl AccountSource for RpcClient {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, PoolError> {
        let response = self
            .get_account_with_commitment(pubkey, self.commitment())
            .await?;
        Ok(response.value)
    }

    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>, PoolError> {
        Ok(RpcClient::get_multiple_accounts(self, pubkeys).await?)
    }
}

/// Fixed set of accounts, for tests and offline replays of a captured state.
#[derive(Debug, Default, Clone)]
pub struct StaticAccounts {
    accounts: HashMap<Pubkey, Account>,
}

impl StaticAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pubkey: Pubkey, account: Account) {
        self.accounts.insert(pubkey, account);
    }

    #[cfg(test)]
    pub fn remove(&mut self, pubkey: &Pubkey) -> Option<Account> {
        self.accounts.remove(pubkey)
    }
}

#[async_trait]
impl AccountSource for StaticAccounts {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, PoolError> {
        Ok(self.accounts.get(pubkey).cloned())
    }

    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>, PoolError> {
        Ok(pubkeys.iter().map(|k| self.accounts.get(k).cloned()).collect())
    }
}
