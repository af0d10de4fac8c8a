//! # Liquidity Engine
//!
//! Orchestrates concentrated-liquidity pools on EVM chains: reads pool
//! state, bootstraps new pools, opens and closes positions, collects fees
//! and executes quoted swaps. All chain access goes through the
//! [`ChainReader`] and [`TransactionSigner`] collaborators, so the same
//! orchestration runs against a node ([`EthersChain`]) or an in-memory chain.
//!
//! ## Components
//!
//! - **[`PoolReader`]**: missing / uninitialized / active pool state
//! - **[`PoolFactory`]**: create and initialize pools, resumable
//! - **[`ApprovalOrchestrator`]**: idempotent wrap and approve
//! - **[`LiquidityManager`]**: mint, collect, and the remove state machine
//! - **[`SwapEngine`]**: quote and exact-input swaps
//! - **[`PositionReader`]**: positions owned by an account
//!
//! ## Example
//!
//! ```rust,no_run
//! use liquidity_engine::{EngineSettings, EthersChain, LiquidityEngine};
//! use lp_config::load_config;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = load_config(None, None)?;
//! let registry = config.registry()?;
//! let contracts = registry.require(config.chain_id)?.clone();
//! let chain = Arc::new(EthersChain::read_only(&config.rpc_url, &config.receipts)?);
//!
//! let engine = LiquidityEngine::new(
//!     chain.clone(),
//!     chain,
//!     contracts,
//!     EngineSettings::from_config(&config)?,
//! );
//! let positions = engine.positions.positions_of(engine.owner()).await?;
//! println!("{} positions", positions.len());
//! # Ok(())
//! # }
//! ```

pub mod approvals;
pub mod engine;
pub mod error;
pub mod ethers_chain;
pub mod executor;
pub mod liquidity;
pub mod logging;
pub mod pool_factory;
pub mod pool_reader;
pub mod positions;
pub mod provider;
pub mod retry;
pub mod swap;

pub use approvals::{ApprovalOrchestrator, TokenRequirement};
pub use engine::{EngineSettings, LiquidityEngine};
pub use error::{EngineError, QuoteFailure, Result};
pub use ethers_chain::EthersChain;
pub use executor::{OperationResult, StepKind, TransactionExecutor};
pub use liquidity::{
    CollectOutcome, LiquidityManager, MintOutcome, MintRequest, RemoveLiquidity, RemoveStage,
};
pub use pool_factory::{PoolBootstrap, PoolFactory};
pub use pool_reader::{PoolReader, PoolSnapshot, PoolState};
pub use positions::{Position, PositionReader};
pub use provider::{ChainReader, FixedPrice, PriceSource, RpcError, TransactionSigner, TxReceipt, TxRequest};
pub use retry::RetryPolicy;
pub use swap::{QuoteOutcome, SwapEngine, SwapOutcome, SwapQuote, SwapRequest};
