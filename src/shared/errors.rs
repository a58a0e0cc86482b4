//! Error handling for the application

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Configuration errors. Always fatal, reported before anything touches the chain.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing env: {0}")]
    MissingEnv(String),

    #[error("Env {name} must be {expected}, got {value:?}")]
    InvalidEnv {
        name: String,
        expected: &'static str,
        value: String,
    },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unsupported pool type: {0}")]
    UnsupportedPoolType(String),

    #[error("Invalid address for {field}: {value}")]
    InvalidAddress { field: String, value: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Pool state errors: anything that makes a pool snapshot untrustworthy.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Invalid owner for {account}. Expected: {expected}, Got: {actual}")]
    InvalidOwner {
        account: Pubkey,
        expected: Pubkey,
        actual: Pubkey,
    },

    #[error("Invalid pool data for {account}: {reason}")]
    InvalidPoolData { account: Pubkey, reason: String },

    #[error("Swap account {0} is not initialized")]
    Uninitialized(Pubkey),

    #[error("Unsupported curve type {curve_type} on swap {swap}")]
    UnsupportedCurve { swap: Pubkey, curve_type: u8 },

    #[error("Cannot derive pool authority for swap {0}")]
    InvalidAuthority(Pubkey),

    #[error("Vault {vault} is owned by {owner}, expected pool authority {authority}")]
    VaultOwnerMismatch {
        vault: Pubkey,
        owner: Pubkey,
        authority: Pubkey,
    },

    #[error("Vault {vault} holds mint {actual}, swap account expects {expected}")]
    VaultMintMismatch {
        vault: Pubkey,
        expected: Pubkey,
        actual: Pubkey,
    },

    #[error("Fee account {fee_account} holds mint {actual}, expected pool mint {pool_mint}")]
    FeeAccountMismatch {
        fee_account: Pubkey,
        pool_mint: Pubkey,
        actual: Pubkey,
    },

    #[error("Configured {field} {configured} does not match on-chain {actual}")]
    ConfigMismatch {
        field: &'static str,
        configured: Pubkey,
        actual: Pubkey,
    },

    #[error("Source mint {mint} is neither mint of pool {swap}")]
    MintNotInPool { swap: Pubkey, mint: Pubkey },

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Arithmetic edge cases of the swap and conversion helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("No liquidity: reserves exhausted")]
    NoLiquidity,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Basis points out of range: {0}")]
    InvalidBps(u32),

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Failures of a single evaluation. There is no partial decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbitrageError {
    #[error("Insufficient liquidity: {0}")]
    NoLiquidity(String),

    #[error("Pools do not trade the same pair: {0}")]
    PairMismatch(String),

    #[error("Invalid trade parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

impl From<solana_client::client_error::ClientError> for PoolError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        PoolError::Rpc(err.to_string())
    }
}
