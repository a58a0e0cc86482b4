use anyhow::Result;
use clap::Parser;
use swaparb::app;
use swaparb::config::{AppCfg, CliConfig, Config};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Two-pool constant-product arbitrage for SPL Token Swap pools")]
struct Args {
    /// RPC endpoint URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Path to keypair file
    #[arg(long)]
    keypair: Option<String>,

    /// Amount to trade, in UI units of pool A's token A
    #[arg(long)]
    amount_in: Option<f64>,

    /// Minimum spread threshold in basis points
    #[arg(long)]
    spread_threshold_bps: Option<u32>,

    /// Slippage tolerance per leg in basis points
    #[arg(long)]
    slippage_bps: Option<u32>,

    /// Compute unit price in microlamports
    #[arg(long)]
    priority_fee: Option<u64>,

    /// Compute unit limit
    #[arg(long)]
    compute_units: Option<u32>,

    /// Only simulate transaction without executing
    #[arg(long)]
    simulate_only: bool,

    /// Path to pools file (defaults to pools.json)
    #[arg(long)]
    pools: Option<String>,

    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Base tokens per SOL, to price the lamport cost
    #[arg(long, env = "RATE_TOKENS_PER_SOL")]
    rate_tokens_per_sol: Option<f64>,
}

impl From<Args> for CliConfig {
    fn from(args: Args) -> Self {
        Self {
            rpc_url: args.rpc_url,
            keypair_path: args.keypair,
            pools_path: args.pools,
            amount_in: args.amount_in,
            spread_threshold_bps: args.spread_threshold_bps,
            slippage_bps: args.slippage_bps,
            priority_fee: args.priority_fee,
            compute_units: args.compute_units,
            rate_tokens_per_sol: args.rate_tokens_per_sol,
            simulate_only: args.simulate_only,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = Args::parse();

    let file_config = match args.config.take() {
        Some(path) => Some(Config::from_file(&path)?),
        None => None,
    };

    // CLI args > config file > defaults
    let app_cfg = AppCfg::resolve(args.into(), file_config)?;

    app::run(app_cfg).await
}
