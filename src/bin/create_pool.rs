//! Provisions an SPL Token Swap constant-product pool and prints its
//! `pools.json` entry.
//!
//! Configured through the environment (a `.env` file is loaded first): RPC_URL, KEYPAIR, optional MINT_A and
//! MINT_B, MINT_A_DECIMALS / MINT_B_DECIMALS (9), LIQUIDITY_A, LIQUIDITY_B,
//! POOL_MINT_DECIMALS (6), TRADE_FEE_NUMERATOR (25), TRADE_FEE_DENOMINATOR (10000).
//! The payer must be the mint authority of any existing mint it passes in.

use anyhow::{bail, Context, Result};
use serde_json::json;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use spl_token::solana_program::program_option::COption;
use spl_token::state::{Account as TokenAccount, Mint};
use swaparb::exchanges::spl_token_swap::instructions::{initialize, trade_fee_only, InitializeAccounts};
use swaparb::exchanges::spl_token_swap::parser::SWAP_ACCOUNT_LEN;
use swaparb::exchanges::types::{PoolKind, SPL_TOKEN_SWAP_PROGRAM_ID};
use swaparb::shared::env::{env_big, env_int, env_opt_str, env_str};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Tokens minted to each of the payer's own accounts for trading.
const PAYER_FLOAT: u64 = 2_000_000_000;

struct Settings {
    rpc_url: String,
    keypair: String,
    mint_a: Option<Pubkey>,
    mint_b: Option<Pubkey>,
    mint_a_decimals: u8,
    mint_b_decimals: u8,
    liquidity_a: u64,
    liquidity_b: u64,
    pool_mint_decimals: u8,
    trade_fee_numerator: u64,
    trade_fee_denominator: u64,
}

fn parse_mint(name: &str) -> Result<Option<Pubkey>> {
    env_opt_str(name)
        .map(|v| v.parse::<Pubkey>().with_context(|| format!("{name} is not a valid address: {v}")))
        .transpose()
}

impl Settings {
    fn from_env() -> Result<Self> {
        let settings = Self {
            rpc_url: env_str("RPC_URL", None)?,
            keypair: env_str("KEYPAIR", None)?,
            mint_a: parse_mint("MINT_A")?,
            mint_b: parse_mint("MINT_B")?,
            mint_a_decimals: env_int("MINT_A_DECIMALS", Some(9))?,
            mint_b_decimals: env_int("MINT_B_DECIMALS", Some(9))?,
            liquidity_a: env_big("LIQUIDITY_A", None)?,
            liquidity_b: env_big("LIQUIDITY_B", None)?,
            pool_mint_decimals: env_int("POOL_MINT_DECIMALS", Some(6))?,
            trade_fee_numerator: env_big("TRADE_FEE_NUMERATOR", Some(25))?,
            trade_fee_denominator: env_big("TRADE_FEE_DENOMINATOR", Some(10_000))?,
        };
        if settings.liquidity_a == 0 || settings.liquidity_b == 0 {
            bail!("LIQUIDITY_A and LIQUIDITY_B must be positive");
        }
        if settings.trade_fee_denominator == 0 || settings.trade_fee_numerator > settings.trade_fee_denominator {
            bail!(
                "trade fee {}/{} is not a valid fraction",
                settings.trade_fee_numerator,
                settings.trade_fee_denominator
            );
        }
        Ok(settings)
    }
}

struct Provisioner {
    client: RpcClient,
    payer: Keypair,
}

impl Provisioner {
    fn send(&self, instructions: &[Instruction], extra_signers: &[&Keypair]) -> Result<Signature> {
        let blockhash = self.client.get_latest_blockhash().context("fetch latest blockhash")?;
        let mut signers: Vec<&Keypair> = vec![&self.payer];
        signers.extend_from_slice(extra_signers);
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            signers.as_slice(),
            blockhash,
        );
        let signature = self
            .client
            .send_and_confirm_transaction(&tx)
            .context("send and confirm transaction")?;
        info!("Confirmed {}", signature);
        Ok(signature)
    }

    fn create_account_ix(&self, account: &Pubkey, space: usize, owner: &Pubkey) -> Result<Instruction> {
        let lamports = self
            .client
            .get_minimum_balance_for_rent_exemption(space)
            .context("fetch rent exemption")?;
        Ok(system_instruction::create_account(
            &self.payer.pubkey(),
            account,
            lamports,
            space as u64,
            owner,
        ))
    }

    fn create_mint(&self, authority: &Pubkey, decimals: u8) -> Result<Pubkey> {
        let mint = Keypair::new();
        let instructions = vec![
            self.create_account_ix(&mint.pubkey(), Mint::LEN, &spl_token::id())?,
            spl_token::instruction::initialize_mint2(
                &spl_token::id(),
                &mint.pubkey(),
                authority,
                None,
                decimals,
            )?,
        ];
        self.send(&instructions, &[&mint])?;
        Ok(mint.pubkey())
    }

    fn create_token_account(&self, mint: &Pubkey, owner: &Pubkey) -> Result<Pubkey> {
        let account = Keypair::new();
        let instructions = vec![
            self.create_account_ix(&account.pubkey(), TokenAccount::LEN, &spl_token::id())?,
            spl_token::instruction::initialize_account3(&spl_token::id(), &account.pubkey(), mint, owner)?,
        ];
        self.send(&instructions, &[&account])?;
        Ok(account.pubkey())
    }

    fn ensure_ata(&self, mint: &Pubkey) -> Result<Pubkey> {
        let payer = self.payer.pubkey();
        let ata = get_associated_token_address(&payer, mint);
        self.send(
            &[create_associated_token_account_idempotent(&payer, &payer, mint, &spl_token::id())],
            &[],
        )?;
        Ok(ata)
    }

    fn mint_to(&self, mint: &Pubkey, account: &Pubkey, amount: u64) -> Result<()> {
        let ix = spl_token::instruction::mint_to(
            &spl_token::id(),
            mint,
            account,
            &self.payer.pubkey(),
            &[],
            amount,
        )?;
        self.send(&[ix], &[])?;
        Ok(())
    }

    fn token_account(&self, address: &Pubkey) -> Result<TokenAccount> {
        let account = self.client.get_account(address).with_context(|| format!("fetch {address}"))?;
        Ok(TokenAccount::unpack(&account.data)?)
    }

    fn mint(&self, address: &Pubkey) -> Result<Mint> {
        let account = self.client.get_account(address).with_context(|| format!("fetch {address}"))?;
        Ok(Mint::unpack(&account.data)?)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;
    let payer = read_keypair_file(&settings.keypair)
        .map_err(|e| anyhow::anyhow!("Failed to load keypair {}: {}", settings.keypair, e))?;
    let program_id: Pubkey = SPL_TOKEN_SWAP_PROGRAM_ID.parse()?;
    let p = Provisioner {
        client: RpcClient::new_with_commitment(settings.rpc_url.clone(), CommitmentConfig::confirmed()),
        payer,
    };
    let payer = p.payer.pubkey();
    info!("Payer: {}", payer);

    let mint_a = match settings.mint_a {
        Some(mint) => {
            info!("Using existing MINT_A: {}", mint);
            mint
        }
        None => {
            let mint = p.create_mint(&payer, settings.mint_a_decimals)?;
            info!("Created MINT_A: {} (decimals: {})", mint, settings.mint_a_decimals);
            mint
        }
    };
    let mint_b = match settings.mint_b {
        Some(mint) => {
            info!("Using existing MINT_B: {}", mint);
            mint
        }
        None => {
            let mint = p.create_mint(&payer, settings.mint_b_decimals)?;
            info!("Created MINT_B: {} (decimals: {})", mint, settings.mint_b_decimals);
            mint
        }
    };

    let user_ata_a = p.ensure_ata(&mint_a)?;
    let user_ata_b = p.ensure_ata(&mint_b)?;

    let swap = Keypair::new();
    let (authority, _bump) = Pubkey::find_program_address(&[swap.pubkey().as_ref()], &program_id);

    let pool_mint = p.create_mint(&authority, settings.pool_mint_decimals)?;
    let vault_a = p.create_token_account(&mint_a, &authority)?;
    let vault_b = p.create_token_account(&mint_b, &authority)?;
    // Initial pool tokens and trading fees land in the same payer account.
    let fee_account = p.ensure_ata(&pool_mint)?;
    let destination = fee_account;

    p.mint_to(&mint_a, &vault_a, settings.liquidity_a)?;
    p.mint_to(&mint_b, &vault_b, settings.liquidity_b)?;

    let (va, vb, pm, fa) = (
        p.token_account(&vault_a)?,
        p.token_account(&vault_b)?,
        p.mint(&pool_mint)?,
        p.token_account(&fee_account)?,
    );
    if va.owner != authority || vb.owner != authority {
        bail!("Vaults must be owned by the swap authority {authority}");
    }
    if pm.mint_authority != COption::Some(authority) {
        bail!("Pool mint authority must be the swap authority {authority}");
    }
    if fa.mint != pool_mint {
        bail!("Fee account {fee_account} must hold the pool mint {pool_mint}");
    }

    let (ma, mb) = (p.mint(&mint_a)?, p.mint(&mint_b)?);
    info!("decimals: A={} B={}", ma.decimals, mb.decimals);
    info!("vaultA amount = {}", swaparb::math::ui(va.amount, ma.decimals));
    info!("vaultB amount = {}", swaparb::math::ui(vb.amount, mb.decimals));

    p.mint_to(&mint_a, &user_ata_a, PAYER_FLOAT)?;
    p.mint_to(&mint_b, &user_ata_b, PAYER_FLOAT)?;

    info!("Creating swap {}", swap.pubkey());
    let fees = trade_fee_only(settings.trade_fee_numerator, settings.trade_fee_denominator);
    let instructions = vec![
        p.create_account_ix(&swap.pubkey(), SWAP_ACCOUNT_LEN, &program_id)?,
        initialize(
            &program_id,
            &InitializeAccounts {
                swap: swap.pubkey(),
                authority,
                vault_a,
                vault_b,
                pool_mint,
                fee_account,
                destination,
            },
            &fees,
        ),
    ];
    p.send(&instructions, &[&swap])?;

    let entry = json!({
        "type": PoolKind::SplTokenSwap.as_str(),
        "programId": program_id.to_string(),
        "swap": swap.pubkey().to_string(),
        "authority": authority.to_string(),
        "vaultA": vault_a.to_string(),
        "vaultB": vault_b.to_string(),
        "mintA": mint_a.to_string(),
        "mintB": mint_b.to_string(),
        "poolMint": pool_mint.to_string(),
        "feeAccount": fee_account.to_string(),
    });
    info!("Copy this entry into pools.json as poolA or poolB");
    println!("{}", serde_json::to_string_pretty(&entry)?);

    Ok(())
}
