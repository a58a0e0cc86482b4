use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::{fs, path::Path};
use crate::exchanges::compute_budget::DEFAULT_COMPUTE_UNITS;
use crate::exchanges::types::PoolKind;
use crate::math::BPS_DENOMINATOR;
use crate::shared::errors::ConfigError;

pub const DEFAULT_POOLS_PATH: &str = "pools.json";

/// Addresses of one pool as written in `pools.json`.
///
/// Only `type`, `programId` and `swap` are needed; the rest is cross-checked
/// against chain state when present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub program_id: String,
    pub swap: String,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub vault_a: Option<String>,
    #[serde(default)]
    pub vault_b: Option<String>,
    #[serde(default)]
    pub mint_a: Option<String>,
    #[serde(default)]
    pub mint_b: Option<String>,
    #[serde(default)]
    pub pool_mint: Option<String>,
    #[serde(default)]
    pub fee_account: Option<String>,
}

fn parse_address(field: &str, value: &str) -> Result<Pubkey, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        field: field.to_string(),
        value: value.to_string(),
    })
}

impl PoolConfig {
    pub fn pool_kind(&self) -> Result<PoolKind, ConfigError> {
        self.kind.parse()
    }

    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        parse_address("programId", &self.program_id)
    }

    pub fn swap(&self) -> Result<Pubkey, ConfigError> {
        parse_address("swap", &self.swap)
    }

    /// Kind and every address present must parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool_kind()?;
        self.program_id()?;
        self.swap()?;
        let optional = [
            ("authority", &self.authority),
            ("vaultA", &self.vault_a),
            ("vaultB", &self.vault_b),
            ("mintA", &self.mint_a),
            ("mintB", &self.mint_b),
            ("poolMint", &self.pool_mint),
            ("feeAccount", &self.fee_account),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                parse_address(field, value)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolsFile {
    pub pool_a: PoolConfig,
    pub pool_b: PoolConfig,
}

impl PoolsFile {
    pub fn from_json(s: &str, path: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_json::from_str(s).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        file.pool_a.validate()?;
        file.pool_b.validate()?;
        Ok(file)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let s = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&s, &display)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcCfg {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletCfg {
    pub keypair: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolsCfg {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeCfg {
    pub amount_in: Option<f64>,
    pub spread_threshold_bps: Option<u32>,
    pub slippage_bps: Option<u32>,
    pub priority_fee_microlamports: Option<u64>,
    pub compute_units: Option<u32>,
    pub rate_tokens_per_sol: Option<f64>,
    pub simulate_only: Option<bool>,
}

/// Optional `Config.toml`. Every value can also come from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcCfg,
    #[serde(default)]
    pub wallet: WalletCfg,
    #[serde(default)]
    pub pools: PoolsCfg,
    #[serde(default)]
    pub trade: TradeCfg,
}

impl Config {
    pub fn from_toml(s: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let s = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_toml(&s, &display)
    }
}

// CLI-based configuration
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub rpc_url: Option<String>,
    pub keypair_path: Option<String>,
    pub pools_path: Option<String>,
    pub amount_in: Option<f64>,
    pub spread_threshold_bps: Option<u32>,
    pub slippage_bps: Option<u32>,
    pub priority_fee: Option<u64>,
    pub compute_units: Option<u32>,
    pub rate_tokens_per_sol: Option<f64>,
    pub simulate_only: bool,
}

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub rpc_url: String,
    pub keypair_path: String,
    pub pools_path: String,
    pub amount_in: f64,
    pub spread_threshold_bps: u32,
    pub slippage_bps: u32,
    pub priority_fee: u64,
    pub compute_units: u32,
    pub rate_tokens_per_sol: Option<f64>,
    pub simulate_only: bool,
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingParameter(name.to_string()))
}

impl AppCfg {
    /// Command line first, then the config file, then defaults.
    pub fn resolve(cli: CliConfig, file: Option<Config>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let trade = file.trade;

        let cfg = Self {
            rpc_url: required(cli.rpc_url.or(file.rpc.url), "--rpc-url")?,
            keypair_path: required(cli.keypair_path.or(file.wallet.keypair), "--keypair")?,
            pools_path: cli
                .pools_path
                .or(file.pools.file)
                .unwrap_or_else(|| DEFAULT_POOLS_PATH.to_string()),
            amount_in: required(cli.amount_in.or(trade.amount_in), "--amount-in")?,
            spread_threshold_bps: required(
                cli.spread_threshold_bps.or(trade.spread_threshold_bps),
                "--spread-threshold-bps",
            )?,
            slippage_bps: required(cli.slippage_bps.or(trade.slippage_bps), "--slippage-bps")?,
            priority_fee: required(
                cli.priority_fee.or(trade.priority_fee_microlamports),
                "--priority-fee",
            )?,
            compute_units: cli
                .compute_units
                .or(trade.compute_units)
                .unwrap_or(DEFAULT_COMPUTE_UNITS),
            rate_tokens_per_sol: cli.rate_tokens_per_sol.or(trade.rate_tokens_per_sol),
            simulate_only: cli.simulate_only || trade.simulate_only.unwrap_or(false),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &str, reason: String| ConfigError::InvalidParameter {
            name: name.to_string(),
            reason,
        };
        if self.rpc_url.trim().is_empty() {
            return Err(invalid("rpc_url", "must not be empty".to_string()));
        }
        if !self.amount_in.is_finite() || self.amount_in <= 0.0 {
            return Err(invalid("amount_in", format!("must be positive, got {}", self.amount_in)));
        }
        if self.slippage_bps > BPS_DENOMINATOR {
            return Err(invalid(
                "slippage_bps",
                format!("must be at most {}, got {}", BPS_DENOMINATOR, self.slippage_bps),
            ));
        }
        if self.compute_units == 0 {
            return Err(invalid("compute_units", "must be positive".to_string()));
        }
        if let Some(rate) = self.rate_tokens_per_sol {
            if !rate.is_finite() || rate < 0.0 {
                return Err(invalid("rate_tokens_per_sol", format!("must be non-negative, got {rate}")));
            }
        }
        Ok(())
    }
}
