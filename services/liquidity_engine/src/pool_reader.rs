//! Pool state reader
//!
//! Derives a pool's address offline and classifies it by reading `slot0()`
//! and `liquidity()`. A pool that cannot be read at all (revert, or `0x`
//! from an address with no code) is `Missing`; that read is the only
//! existence check. Transient RPC failures are retried and never mistaken
//! for a missing pool.

use crate::error::{EngineError, Result};
use crate::log_search;
use crate::provider::{ChainReader, RpcError};
use crate::retry::RetryPolicy;
use ethereum_types::{Address, H256, U256};
use lp_amm::PriceContext;
use lp_config::ChainContracts;
use lp_dex::abi::{factory, pool};
use lp_dex::{compute_pool_address, AbiError, PoolKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What is known about a pool on-chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PoolState {
    /// No contract answers at the derived address
    Missing,
    /// Deployed by the factory but `initialize` never ran
    Uninitialized,
    Active {
        sqrt_price_x96: U256,
        tick: i32,
        liquidity: u128,
    },
}

impl PoolState {
    pub fn exists(&self) -> bool {
        !matches!(self, PoolState::Missing)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PoolState::Active { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub key: PoolKey,
    pub address: Address,
    pub state: PoolState,
}

impl PoolSnapshot {
    pub fn price_context(&self) -> Option<PriceContext> {
        match self.state {
            PoolState::Active {
                sqrt_price_x96,
                tick,
                ..
            } => Some(PriceContext {
                sqrt_price_x96,
                tick,
            }),
            _ => None,
        }
    }

    pub fn liquidity(&self) -> u128 {
        match self.state {
            PoolState::Active { liquidity, .. } => liquidity,
            _ => 0,
        }
    }

    /// Price context of an active pool, or the matching pool-state error
    pub fn require_active(&self) -> Result<PriceContext> {
        match self.state {
            PoolState::Missing => Err(EngineError::PoolNotFound { pool: self.address }),
            PoolState::Uninitialized => Err(EngineError::PoolNotInitialized { pool: self.address }),
            PoolState::Active { .. } => self
                .price_context()
                .ok_or(EngineError::PoolNotInitialized { pool: self.address }),
        }
    }
}

/// A read that failed because nothing meaningful lives at the address
fn is_absent(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::Rpc(RpcError::Reverted { .. } | RpcError::EmptyResponse)
            | EngineError::Abi(AbiError::EmptyResponse { .. } | AbiError::Decode { .. })
    )
}

#[derive(Clone)]
pub struct PoolReader {
    reader: Arc<dyn ChainReader>,
    factory: Address,
    init_code_hash: H256,
    retry: RetryPolicy,
}

impl PoolReader {
    pub fn new(reader: Arc<dyn ChainReader>, contracts: &ChainContracts, retry: RetryPolicy) -> Self {
        Self {
            reader,
            factory: contracts.factory,
            init_code_hash: contracts.pool_init_code_hash,
            retry,
        }
    }

    pub fn pool_address(&self, key: &PoolKey) -> Address {
        compute_pool_address(self.factory, key, self.init_code_hash)
    }

    /// `eth_call` with retry on transient failures
    pub(crate) async fn call(&self, operation: &str, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let reader = &self.reader;
        self.retry
            .run(operation, || reader.call(to, data.clone()))
            .await
    }

    async fn read_slot0(&self, address: Address) -> Result<pool::Slot0> {
        let raw = self.call("slot0", address, pool::encode_slot0()?).await?;
        Ok(pool::decode_slot0(&raw)?)
    }

    async fn read_liquidity(&self, address: Address) -> Result<u128> {
        let raw = self.call("liquidity", address, pool::encode_liquidity()?).await?;
        Ok(pool::decode_liquidity(&raw)?)
    }

    pub async fn read(&self, key: &PoolKey) -> Result<PoolSnapshot> {
        let address = self.pool_address(key);
        let state = self.read_state(address).await?;
        log_search!("Pool {} at {:?}: {:?}", key, address, state);
        Ok(PoolSnapshot {
            key: *key,
            address,
            state,
        })
    }

    pub async fn read_state(&self, address: Address) -> Result<PoolState> {
        let (slot0, liquidity) = tokio::join!(self.read_slot0(address), self.read_liquidity(address));

        let slot0 = match slot0 {
            Ok(slot0) => slot0,
            Err(e) if is_absent(&e) => return Ok(PoolState::Missing),
            Err(e) => return Err(e),
        };
        if !slot0.is_initialized() {
            return Ok(PoolState::Uninitialized);
        }

        Ok(PoolState::Active {
            sqrt_price_x96: slot0.sqrt_price_x96,
            tick: slot0.tick,
            liquidity: liquidity?,
        })
    }

    /// Address the factory has registered for `key`; zero when none
    pub async fn registered_pool(&self, key: &PoolKey) -> Result<Address> {
        let raw = self
            .call("getPool", self.factory, factory::encode_get_pool(key)?)
            .await?;
        Ok(factory::decode_get_pool(&raw)?)
    }
}
