// src/app.rs
use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{read_keypair_file, Signer},
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use spl_token::state::Account as TokenAccount;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{AppCfg, PoolsFile};
use crate::exchanges::account_source::AccountSource;
use crate::exchanges::{create_adapter, PoolAdapter};
use crate::exchanges::transaction_builder::{ArbitrageInstructions, TransactionBuilder};
use crate::exchanges::types::{PoolState, SwapRequest};
use crate::exchanges::utils::{format_pool_address, format_sol, lamports_to_sol};
use crate::math::ui;
use crate::opportunity::{evaluate, TradeParams};
use crate::report::ArbitrageReport;
use crate::shared::errors::PoolError;

/// Payer's associated token account for `mint`, plus the instruction creating
/// it when it does not exist yet.
pub async fn ensure_ata(
    source: &dyn AccountSource,
    payer: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, Option<Instruction>)> {
    let ata = get_associated_token_address(payer, mint);
    let existing = source
        .get_account(&ata)
        .await
        .with_context(|| format!("fetch associated token account {ata}"))?;

    match existing {
        Some(_) => Ok((ata, None)),
        None => {
            info!("Associated token account {} for mint {} will be created", ata, mint);
            let ix = create_associated_token_account_idempotent(payer, payer, mint, &spl_token::id());
            Ok((ata, Some(ix)))
        }
    }
}

/// Both snapshots, fetched concurrently. Either failure fails the whole load.
pub async fn load_pool_states(
    pool_a: &dyn PoolAdapter,
    pool_b: &dyn PoolAdapter,
) -> Result<(PoolState, PoolState), PoolError> {
    tokio::try_join!(pool_a.load_state(), pool_b.load_state())
}

/// Outcome of a `simulateTransaction` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub logs: Vec<String>,
    pub error: Option<String>,
}

impl Simulation {
    pub fn steps(&self) -> Vec<String> {
        let status = match &self.error {
            None => "simulate status: OK".to_string(),
            Some(err) => format!("simulate status: ERR {err}"),
        };
        let tail = self.logs.len().saturating_sub(10);
        vec![status, format!("simulate logs: {}", self.logs[tail..].join(" | "))]
    }
}

/// Outcome of sending the arbitrage transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Refused before landing, e.g. by preflight.
    Rejected(String),
    /// Has a signature; `error` is set when it failed or was never confirmed.
    Landed { signature: String, error: Option<String> },
}

impl Submission {
    pub fn signature(&self) -> Option<&str> {
        match self {
            Submission::Rejected(_) => None,
            Submission::Landed { signature, .. } => Some(signature),
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Submission::Rejected(err) => Some(err),
            Submission::Landed { error, .. } => error.as_deref(),
        }
    }

    pub fn steps(&self) -> Vec<String> {
        match self {
            Submission::Rejected(err) => vec![format!("send failed: {err}")],
            Submission::Landed { signature, error } => vec![
                format!("sent tx: {signature}"),
                match error {
                    None => "confirm status: OK".to_string(),
                    Some(err) => format!("confirm status: ERR {err}"),
                },
            ],
        }
    }
}

fn pool_step(label: &str, state: &PoolState) -> String {
    format!(
        "Loaded {}: swap={} fee={} bps reservesA={} reservesB={}",
        label,
        format_pool_address(&state.swap),
        state.fee_bps,
        ui(state.reserve_a, state.decimals_a),
        ui(state.reserve_b, state.decimals_b)
    )
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!("Starting swaparb run");
    info!("Configuration: {:?}", app_cfg);

    let pools = PoolsFile::from_file(&app_cfg.pools_path)?;

    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        app_cfg.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));
    let source: Arc<dyn AccountSource> = rpc_client.clone();

    let payer = read_keypair_file(&app_cfg.keypair_path)
        .map_err(|e| anyhow::anyhow!("Failed to load keypair {}: {}", app_cfg.keypair_path, e))?;
    info!("Loaded keypair: {}", payer.pubkey());

    let adapter_a = create_adapter(&pools.pool_a, source.clone()).context("pool A")?;
    let adapter_b = create_adapter(&pools.pool_b, source.clone()).context("pool B")?;

    let (state_a, state_b) = load_pool_states(adapter_a.as_ref(), adapter_b.as_ref())
        .await
        .context("load pool states")?;

    let mut steps = vec![pool_step("poolA", &state_a), pool_step("poolB", &state_b)];

    let (ata_a, create_ata_a) = ensure_ata(source.as_ref(), &payer.pubkey(), &state_a.mint_a).await?;
    let (ata_b, create_ata_b) = ensure_ata(source.as_ref(), &payer.pubkey(), &state_a.mint_b).await?;
    let setup: Vec<Instruction> = create_ata_a.into_iter().chain(create_ata_b).collect();

    let rent_lamports = if setup.is_empty() {
        0
    } else {
        let rent = rpc_client
            .get_minimum_balance_for_rent_exemption(TokenAccount::LEN)
            .await
            .context("fetch token account rent")?;
        rent * setup.len() as u64
    };

    let params = TradeParams {
        amount_in: app_cfg.amount_in,
        spread_threshold_bps: app_cfg.spread_threshold_bps,
        slippage_bps: app_cfg.slippage_bps,
        priority_fee_micro_lamports: app_cfg.priority_fee,
        compute_units: app_cfg.compute_units,
        rent_lamports,
        rate_tokens_per_sol: app_cfg.rate_tokens_per_sol,
    };
    let decision = evaluate(&state_a, &state_b, &params)?;

    steps.push(format!(
        "Prices: priceA={:.8} priceB={:.8} spread_bps={:.2}",
        decision.price_a, decision.price_b, decision.spread_bps
    ));
    steps.push(format!(
        "AmountIn={}, out1={}, out2={}, pnl={}",
        app_cfg.amount_in, decision.expected_out_leg1, decision.expected_out_leg2, decision.pnl_tokens
    ));
    steps.push(format!(
        "Cost: {} lamports ({}), {} accounts to create",
        decision.lamports_cost,
        format_sol(lamports_to_sol(decision.lamports_cost)),
        setup.len()
    ));

    let leg_a = adapter_a.build_swap_instruction(
        &state_a,
        &SwapRequest {
            user: payer.pubkey(),
            user_source_ata: ata_a,
            user_dest_ata: ata_b,
            source_mint: state_a.mint_a,
            amount_in: decision.raw.amount_in,
            min_out: decision.raw.min_out_leg1,
        },
    )?;
    let leg_b = adapter_b.build_swap_instruction(
        &state_b,
        &SwapRequest {
            user: payer.pubkey(),
            user_source_ata: ata_b,
            user_dest_ata: ata_a,
            source_mint: state_a.mint_b,
            amount_in: decision.raw.expected_out_leg1,
            min_out: decision.raw.min_out_leg2,
        },
    )?;

    let builder = TransactionBuilder::new(app_cfg.compute_units, app_cfg.priority_fee);
    let recent_blockhash = rpc_client
        .get_latest_blockhash()
        .await
        .context("fetch latest blockhash")?;
    let transaction = builder.build_arbitrage_transaction(
        ArbitrageInstructions { setup, leg_a, leg_b },
        &payer,
        recent_blockhash,
    )?;
    builder.validate_transaction(&transaction)?;

    let pools_snapshot = vec![state_a, state_b];
    let (report, failure) = if app_cfg.simulate_only || !decision.trade_allowed {
        if !decision.trade_allowed {
            for reason in &decision.reasons {
                info!("Trade not allowed: {}", reason);
            }
        }
        let simulation = simulate(&rpc_client, &transaction).await?;
        steps.extend(simulation.steps());
        let report = ArbitrageReport::new(steps, decision, true)
            .with_pools(pools_snapshot)
            .with_simulation_logs(simulation.logs);
        (report, None)
    } else {
        let submission = submit(&rpc_client, &transaction).await;
        steps.extend(submission.steps());
        let mut report = ArbitrageReport::new(steps, decision, false).with_pools(pools_snapshot);
        if let Some(signature) = submission.signature() {
            report = report.with_signature(signature.to_string());
        }
        (report, submission.failure().map(str::to_string))
    };

    println!("{}", report.to_json()?);

    if let Some(err) = failure {
        anyhow::bail!("arbitrage transaction failed: {err}");
    }
    Ok(())
}

async fn simulate(rpc_client: &RpcClient, transaction: &Transaction) -> Result<Simulation> {
    info!("🧪 Simulating transaction");
    let response = rpc_client
        .simulate_transaction(transaction)
        .await
        .context("simulate transaction")?;

    let error = response.value.err.as_ref().map(|err| err.to_string());
    match &error {
        Some(err) => warn!("⚠️ Simulation failed: {}", err),
        None => info!("✅ Simulation succeeded ({:?} CU)", response.value.units_consumed),
    }
    Ok(Simulation {
        logs: response.value.logs.unwrap_or_default(),
        error,
    })
}

/// Send, then wait for the configured commitment and read the final status.
async fn submit(rpc_client: &RpcClient, transaction: &Transaction) -> Submission {
    info!("🚀 Sending arbitrage transaction");
    let signature = match rpc_client.send_transaction(transaction).await {
        Ok(signature) => signature,
        Err(err) => {
            error!("❌ Send failed: {}", err);
            return Submission::Rejected(err.to_string());
        }
    };
    info!("📤 Sent: {}", signature);

    let commitment = rpc_client.commitment();
    let error = match rpc_client
        .poll_for_signature_with_commitment(&signature, commitment)
        .await
    {
        Err(err) => Some(err.to_string()),
        Ok(()) => match rpc_client
            .get_signature_status_with_commitment(&signature, commitment)
            .await
        {
            Ok(Some(Ok(()))) => None,
            Ok(Some(Err(err))) => Some(err.to_string()),
            Ok(None) => Some("status unavailable".to_string()),
            Err(err) => Some(format!("status lookup failed: {err}")),
        },
    };

    match &error {
        None => info!("✅ Confirmed: {}", signature),
        Some(err) => error!("❌ Transaction {} failed: {}", signature, err),
    }
    Submission::Landed {
        signature: signature.to_string(),
        error,
    }
}
