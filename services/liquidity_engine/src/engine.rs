//! # Liquidity Engine - Component Wiring
//!
//! ## Purpose
//!
//! Builds every component over one reader, one signer and one chain's
//! contracts, and exposes them through a single handle. Components can also
//! be constructed individually; the engine is only wiring.
//!
//! ## Architecture Role
//!
//! ```text
//!                       ┌──────────── LiquidityEngine ─────────────┐
//! EngineConfig ──> EngineSettings     │                             │
//! ChainContracts ─────────────────────┤ PoolReader   PositionReader │
//! ChainReader ────────────────────────┤ PoolFactory  SwapEngine     │
//! TransactionSigner ──────────────────┤ Approvals    LiquidityManager
//!                       └──────────────────────────────────────────┘
//! ```

use crate::approvals::ApprovalOrchestrator;
use crate::executor::TransactionExecutor;
use crate::liquidity::LiquidityManager;
use crate::pool_factory::PoolFactory;
use crate::pool_reader::PoolReader;
use crate::positions::PositionReader;
use crate::provider::{ChainReader, TransactionSigner};
use crate::retry::RetryPolicy;
use crate::swap::SwapEngine;
use lp_amm::{AmmError, SlippageTolerance};
use lp_config::{ChainContracts, EngineConfig};
use std::sync::Arc;

/// Trading parameters shared by all components
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub slippage: SlippageTolerance,
    pub deadline_secs: u64,
    pub single_sided_width: u32,
    pub retry: RetryPolicy,
}

impl EngineSettings {
    pub fn from_config(config: &EngineConfig) -> Result<Self, AmmError> {
        Ok(Self {
            slippage: SlippageTolerance::from_bps(config.slippage_bps)?,
            deadline_secs: config.deadline_secs,
            single_sided_width: config.single_sided_width,
            retry: RetryPolicy::from(&config.retry),
        })
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            slippage: SlippageTolerance::default(),
            deadline_secs: 1_200,
            single_sided_width: 10,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct LiquidityEngine {
    pub pools: PoolReader,
    pub factory: PoolFactory,
    pub approvals: ApprovalOrchestrator,
    pub liquidity: LiquidityManager,
    pub swaps: SwapEngine,
    pub positions: PositionReader,
    contracts: ChainContracts,
    settings: EngineSettings,
    executor: TransactionExecutor,
}

impl LiquidityEngine {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        signer: Arc<dyn TransactionSigner>,
        contracts: ChainContracts,
        settings: EngineSettings,
    ) -> Self {
        let retry = settings.retry.clone();
        let executor = TransactionExecutor::new(signer, retry.clone());
        let pools = PoolReader::new(reader.clone(), &contracts, retry.clone());
        let positions = PositionReader::new(reader.clone(), contracts.position_manager, retry.clone());
        let approvals = ApprovalOrchestrator::new(reader, executor.clone(), retry);
        let factory = PoolFactory::new(pools.clone(), executor.clone(), contracts.factory);
        let liquidity = LiquidityManager::new(
            pools.clone(),
            positions.clone(),
            approvals.clone(),
            executor.clone(),
            &contracts,
            settings.clone(),
        );
        let swaps = SwapEngine::new(
            pools.clone(),
            approvals.clone(),
            executor.clone(),
            &contracts,
            settings.clone(),
        );

        Self {
            pools,
            factory,
            approvals,
            liquidity,
            swaps,
            positions,
            contracts,
            settings,
            executor,
        }
    }

    pub fn contracts(&self) -> &ChainContracts {
        &self.contracts
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn owner(&self) -> ethereum_types::Address {
        self.executor.owner()
    }
}
