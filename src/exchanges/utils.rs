use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};

/// Shortened address for log lines: first and last 8 characters.
pub fn format_pool_address(address: &Pubkey) -> String {
    let s = address.to_string();
    if s.len() <= 16 {
        return s;
    }
    format!("{}...{}", &s[..8], &s[s.len() - 8..])
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

pub fn format_sol(sol: f64) -> String {
    format!("{sol:.9} SOL")
}
