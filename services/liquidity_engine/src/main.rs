//! Liquidity Engine Binary
//!
//! Inspection commands over a JSON-RPC endpoint, plus fee collection and
//! position removal signed with the key named by `signer_key_env`. Output is
//! JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethereum_types::{Address, U256};
use liquidity_engine::{
    EngineSettings, EthersChain, LiquidityEngine, PositionReader, RemoveLiquidity, SwapRequest,
};
use lp_amm::FeeTier;
use lp_config::{load_config, EngineConfig};
use lp_dex::{PoolKey, Token};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "liquidity-engine")]
#[command(about = "Concentrated-liquidity pool and position tool")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay (loads environments/<env>.toml next to the config)
    #[arg(short, long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derived address and current state of a pool
    PoolState {
        #[arg(long)]
        token_a: Address,
        #[arg(long)]
        token_b: Address,
        /// Fee in hundredths of a basis point (500, 3000, ...)
        #[arg(long)]
        fee: u32,
    },
    /// Positions owned by an account, optionally for one pool
    Positions {
        #[arg(long)]
        owner: Address,
        #[arg(long, requires_all = ["token_b", "fee"])]
        token_a: Option<Address>,
        #[arg(long)]
        token_b: Option<Address>,
        #[arg(long)]
        fee: Option<u32>,
    },
    /// Exact-input quote from the on-chain quoter
    Quote {
        #[arg(long)]
        token_in: Address,
        #[arg(long)]
        token_out: Address,
        #[arg(long)]
        fee: u32,
        /// Input amount in the token's smallest unit
        #[arg(long)]
        amount: String,
    },
    /// Collect all owed fees of a position (signs)
    Collect {
        #[arg(long)]
        token_id: String,
        /// Withdraw any wrapped-native balance afterwards
        #[arg(long)]
        unwrap: bool,
    },
    /// Decrease, collect and burn a position (signs); resumes from the
    /// progress file when it exists
    Remove {
        #[arg(long)]
        token_id: String,
        #[arg(long, default_value = "remove-progress.json")]
        progress: PathBuf,
    },
}

impl Command {
    fn signs(&self) -> bool {
        matches!(self, Command::Collect { .. } | Command::Remove { .. })
    }
}

fn token(chain_id: u64, address: Address) -> Token {
    Token::new(chain_id, address, 18, format!("{:?}", address))
}

fn parse_amount(value: &str) -> Result<U256> {
    U256::from_dec_str(value).with_context(|| format!("Invalid amount {}", value))
}

fn connect(config: &EngineConfig, signing: bool) -> Result<EthersChain> {
    let chain = if signing {
        let key = config.signer_key()?;
        EthersChain::with_signer(&config.rpc_url, &key, config.chain_id, &config.receipts)
    } else {
        EthersChain::read_only(&config.rpc_url, &config.receipts)
    };
    chain.context("Failed to create RPC client")
}

fn load_progress(path: &Path, token_id: U256) -> Result<RemoveLiquidity> {
    if !path.exists() {
        return Ok(RemoveLiquidity::new(token_id));
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let progress = RemoveLiquidity::from_json(&json)?;
    if progress.token_id != token_id {
        anyhow::bail!(
            "{} tracks position {}, not {}",
            path.display(),
            progress.token_id,
            token_id
        );
    }
    Ok(progress)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.clone(), args.env.as_deref())
        .context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = config.registry()?;
    let contracts = registry.require(config.chain_id)?.clone();
    let chain = Arc::new(connect(&config, args.command.signs())?);
    info!("🚀 Connected to chain {} via {}", config.chain_id, config.rpc_url);

    let settings = EngineSettings::from_config(&config)?;
    let engine = LiquidityEngine::new(chain.clone(), chain, contracts, settings);

    match args.command {
        Command::PoolState {
            token_a,
            token_b,
            fee,
        } => {
            let key = PoolKey::new(token_a, token_b, FeeTier::from_fee(fee)?)?;
            print_json(&engine.pools.read(&key).await?)
        }
        Command::Positions {
            owner,
            token_a,
            token_b,
            fee,
        } => {
            let positions: &PositionReader = &engine.positions;
            let found = match (token_a, token_b, fee) {
                (Some(a), Some(b), Some(fee)) => {
                    let key = PoolKey::new(a, b, FeeTier::from_fee(fee)?)?;
                    positions.positions_for_pool(owner, &key).await?
                }
                _ => positions.positions_of(owner).await?,
            };
            print_json(&found)
        }
        Command::Quote {
            token_in,
            token_out,
            fee,
            amount,
        } => {
            let amount_in = parse_amount(&amount)?;
            let request = SwapRequest {
                token_in: token(config.chain_id, token_in),
                token_out: token(config.chain_id, token_out),
                fee: FeeTier::from_fee(fee)?,
                amount_in,
                recipient: None,
            };
            print_json(&engine.swaps.quote(&request).await?)
        }
        Command::Collect { token_id, unwrap } => {
            let token_id = parse_amount(&token_id)?;
            print_json(&engine.liquidity.collect_fees(token_id, unwrap).await?)
        }
        Command::Remove { token_id, progress } => {
            let token_id = parse_amount(&token_id)?;
            let mut state = load_progress(&progress, token_id)?;
            let result = engine.liquidity.remove_liquidity(&mut state).await;

            // Saved on failure too, so a rerun resumes at the failed stage
            fs::write(&progress, state.to_json()?)
                .with_context(|| format!("Failed to write {}", progress.display()))?;
            result?;
            info!("✅ Position {} removed", token_id);
            print_json(&state)
        }
    }
}
