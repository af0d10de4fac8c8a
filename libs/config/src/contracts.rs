//! Per-chain contract addresses
//!
//! Addresses are never hard-coded at call sites; the engine receives a
//! `ChainContracts` for its chain at startup.

use anyhow::{anyhow, Context, Result};
use ethereum_types::{Address, H256};
use lp_dex::POOL_INIT_CODE_HASH;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Deployed periphery and core contracts on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainContracts {
    pub chain_id: u64,
    pub factory: Address,
    pub position_manager: Address,
    pub swap_router: Address,
    pub quoter: Address,
    pub wrapped_native: Address,
    pub pool_init_code_hash: H256,
}

/// Partial entry from configuration, layered over the built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractOverrides {
    pub factory: Option<Address>,
    pub position_manager: Option<Address>,
    pub swap_router: Option<Address>,
    pub quoter: Option<Address>,
    pub wrapped_native: Option<Address>,
    pub pool_init_code_hash: Option<H256>,
}

// Uniswap V3 uses the same core/periphery addresses on these chains
const UNISWAP_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";
const UNISWAP_V3_POSITION_MANAGER: &str = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88";
const UNISWAP_V3_SWAP_ROUTER: &str = "0xE592427A0AEce92De3Edee1F18E0157C05861564";
const UNISWAP_V3_QUOTER_V2: &str = "0x61fFE014bA17989E743c5F6cB21bF9697530B21e";

const BUILTIN_WRAPPED_NATIVE: [(u64, &str); 3] = [
    (1, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),     // WETH
    (137, "0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),   // WMATIC
    (42161, "0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"), // WETH
];

fn parse_address(value: &str) -> Result<Address> {
    value
        .parse()
        .with_context(|| format!("Invalid address literal {}", value))
}

impl ChainContracts {
    /// Uniswap V3 deployment for a supported chain
    pub fn builtin(chain_id: u64) -> Result<Option<Self>> {
        let Some((_, wrapped)) = BUILTIN_WRAPPED_NATIVE
            .iter()
            .find(|(id, _)| *id == chain_id)
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            chain_id,
            factory: parse_address(UNISWAP_V3_FACTORY)?,
            position_manager: parse_address(UNISWAP_V3_POSITION_MANAGER)?,
            swap_router: parse_address(UNISWAP_V3_SWAP_ROUTER)?,
            quoter: parse_address(UNISWAP_V3_QUOTER_V2)?,
            wrapped_native: parse_address(wrapped)?,
            pool_init_code_hash: POOL_INIT_CODE_HASH,
        }))
    }

    fn apply(&mut self, overrides: &ContractOverrides) {
        if let Some(factory) = overrides.factory {
            self.factory = factory;
        }
        if let Some(position_manager) = overrides.position_manager {
            self.position_manager = position_manager;
        }
        if let Some(swap_router) = overrides.swap_router {
            self.swap_router = swap_router;
        }
        if let Some(quoter) = overrides.quoter {
            self.quoter = quoter;
        }
        if let Some(wrapped_native) = overrides.wrapped_native {
            self.wrapped_native = wrapped_native;
        }
        if let Some(hash) = overrides.pool_init_code_hash {
            self.pool_init_code_hash = hash;
        }
    }

    fn from_overrides(chain_id: u64, overrides: &ContractOverrides) -> Result<Self> {
        let missing = |field: &str| anyhow!("chain {} has no built-in contracts; {} must be configured", chain_id, field);
        Ok(Self {
            chain_id,
            factory: overrides.factory.ok_or_else(|| missing("factory"))?,
            position_manager: overrides
                .position_manager
                .ok_or_else(|| missing("position_manager"))?,
            swap_router: overrides.swap_router.ok_or_else(|| missing("swap_router"))?,
            quoter: overrides.quoter.ok_or_else(|| missing("quoter"))?,
            wrapped_native: overrides
                .wrapped_native
                .ok_or_else(|| missing("wrapped_native"))?,
            pool_init_code_hash: overrides.pool_init_code_hash.unwrap_or(POOL_INIT_CODE_HASH),
        })
    }
}

/// Contract addresses keyed by chain id
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    chains: HashMap<u64, ChainContracts>,
}

impl ContractRegistry {
    /// Registry holding only the built-in deployments
    pub fn with_defaults() -> Result<Self> {
        let mut chains = HashMap::new();
        for (chain_id, _) in BUILTIN_WRAPPED_NATIVE {
            if let Some(contracts) = ChainContracts::builtin(chain_id)? {
                chains.insert(chain_id, contracts);
            }
        }
        Ok(Self { chains })
    }

    /// Built-in deployments with configured overrides layered on top.
    /// Keys are chain ids as strings (TOML table keys).
    pub fn from_overrides(overrides: &HashMap<String, ContractOverrides>) -> Result<Self> {
        let mut registry = Self::with_defaults()?;
        for (key, entry) in overrides {
            let chain_id: u64 = key
                .parse()
                .with_context(|| format!("Contract table key {:?} is not a chain id", key))?;
            match registry.chains.get_mut(&chain_id) {
                Some(contracts) => {
                    debug!("Applying contract overrides for chain {}", chain_id);
                    contracts.apply(entry);
                }
                None => {
                    debug!("Registering contracts for chain {}", chain_id);
                    registry
                        .chains
                        .insert(chain_id, ChainContracts::from_overrides(chain_id, entry)?);
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainContracts> {
        self.chains.get(&chain_id)
    }

    pub fn require(&self, chain_id: u64) -> Result<&ChainContracts> {
        self.get(chain_id)
            .ok_or_else(|| {
                anyhow!(
                    "No contract registry entry for chain {} (known chains: {:?})",
                    chain_id,
                    self.chain_ids()
                )
            })
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.chains.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
