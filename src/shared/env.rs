//! Environment variable helpers for the provisioning tool.
//!
//! An unset variable and an empty one are treated the same way.

use std::env;
use crate::shared::errors::ConfigError;

fn read(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}

/// Required string, or `default` when unset.
pub fn env_str(name: &str, default: Option<&str>) -> Result<String, ConfigError> {
    match read(name) {
        Some(v) => Ok(v),
        None => default
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingEnv(name.to_string())),
    }
}

pub fn env_opt_str(name: &str) -> Option<String> {
    read(name)
}

/// Small integer such as a decimals count.
pub fn env_int(name: &str, default: Option<u8>) -> Result<u8, ConfigError> {
    match read(name) {
        Some(v) => v.trim().parse::<u8>().map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            expected: "a small non-negative integer",
            value: v,
        }),
        None => default.ok_or_else(|| ConfigError::MissingEnv(name.to_string())),
    }
}

/// Raw token amount. Underscores are accepted as visual separators: "100_000".
pub fn env_big(name: &str, default: Option<u64>) -> Result<u64, ConfigError> {
    match read(name) {
        Some(v) => {
            let clean: String = v.chars().filter(|c| *c != '_').collect();
            clean.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: name.to_string(),
                expected: "an unsigned 64-bit integer",
                value: v,
            })
        }
        None => default.ok_or_else(|| ConfigError::MissingEnv(name.to_string())),
    }
}
