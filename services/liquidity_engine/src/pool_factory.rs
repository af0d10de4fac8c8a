//! Pool creation and initialization
//!
//! Create and initialize are separate transactions. A pool can therefore be
//! left deployed but unpriced, and [`PoolFactory::bootstrap_pool`] picks up
//! from whichever state it finds.

use crate::error::{EngineError, Result};
use crate::executor::{OperationResult, StepKind, TransactionExecutor};
use crate::pool_reader::{PoolReader, PoolState};
use crate::provider::{PriceSource, TxRequest};
use crate::{log_pool, log_warning};
use ethereum_types::{Address, U256};
use lp_amm::tick_math::{
    adjust_price_for_decimals, default_sqrt_price_x96, safe_sqrt_price_x96, MAX_SQRT_RATIO,
    MIN_SQRT_RATIO,
};
use lp_amm::FeeTier;
use lp_dex::abi::{factory, pool};
use lp_dex::{sort_tokens, PoolKey, Token};
use serde::{Deserialize, Serialize};

/// Outcome of creating and/or initializing a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBootstrap {
    pub pool: Address,
    pub sqrt_price_x96: U256,
    pub steps: Vec<OperationResult>,
}

/// Substitute price 1 for a starting price the pool would reject
pub fn checked_initial_price(sqrt_price_x96: U256) -> U256 {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        log_warning!(
            "sqrtPriceX96 {} outside [{}, {}), initializing at price 1",
            sqrt_price_x96,
            MIN_SQRT_RATIO,
            MAX_SQRT_RATIO
        );
        return default_sqrt_price_x96();
    }
    sqrt_price_x96
}

/// Pool starting price from a human price of `base` in `quote`, oriented to
/// token1-per-token0 and scaled by the tokens' decimals
pub fn starting_sqrt_price(base: &Token, quote: &Token, human_price: f64) -> Result<U256> {
    let (token0, token1) = sort_tokens(base, quote);
    let token1_per_token0 = if token0.address == base.address {
        human_price
    } else {
        1.0 / human_price
    };
    let raw = adjust_price_for_decimals(token1_per_token0, token0.decimals, token1.decimals);
    Ok(safe_sqrt_price_x96(raw)?)
}

#[derive(Clone)]
pub struct PoolFactory {
    pools: PoolReader,
    executor: TransactionExecutor,
    factory: Address,
}

impl PoolFactory {
    pub fn new(pools: PoolReader, executor: TransactionExecutor, factory: Address) -> Self {
        Self {
            pools,
            executor,
            factory,
        }
    }

    /// Create and initialize a pool that must not exist yet
    pub async fn create_pool(&self, key: &PoolKey, sqrt_price_x96: U256) -> Result<PoolBootstrap> {
        let snapshot = self.pools.read(key).await?;
        if snapshot.state.exists() {
            return Err(EngineError::PoolAlreadyExists {
                pool: snapshot.address,
                initialized: snapshot.state.is_active(),
            });
        }
        self.deploy_and_initialize(key, sqrt_price_x96).await
    }

    /// Bring a pool to the active state from wherever it is:
    /// missing pools are created then initialized, uninitialized pools are
    /// only initialized, active pools are an error.
    pub async fn bootstrap_pool(&self, key: &PoolKey, sqrt_price_x96: U256) -> Result<PoolBootstrap> {
        let snapshot = self.pools.read(key).await?;
        match snapshot.state {
            PoolState::Missing => self.deploy_and_initialize(key, sqrt_price_x96).await,
            PoolState::Uninitialized => {
                log_pool!("Pool {:?} deployed but unpriced, initializing only", snapshot.address);
                let sqrt_price_x96 = checked_initial_price(sqrt_price_x96);
                let step = self.initialize(snapshot.address, sqrt_price_x96).await?;
                Ok(PoolBootstrap {
                    pool: snapshot.address,
                    sqrt_price_x96,
                    steps: vec![step],
                })
            }
            PoolState::Active { .. } => Err(EngineError::PoolAlreadyExists {
                pool: snapshot.address,
                initialized: true,
            }),
        }
    }

    /// Bootstrap with the starting price taken from an external source
    pub async fn bootstrap_pool_from_source(
        &self,
        token_a: &Token,
        token_b: &Token,
        fee: FeeTier,
        source: &dyn PriceSource,
    ) -> Result<PoolBootstrap> {
        let key = PoolKey::from_tokens(token_a, token_b, fee)?;
        let price = source.price(token_a, token_b).await?;
        let sqrt_price_x96 = starting_sqrt_price(token_a, token_b, price)?;
        log_pool!(
            "Starting price for {}/{}: {} (sqrtPriceX96 {})",
            token_a.symbol,
            token_b.symbol,
            price,
            sqrt_price_x96
        );
        self.bootstrap_pool(&key, sqrt_price_x96).await
    }

    async fn deploy_and_initialize(&self, key: &PoolKey, sqrt_price_x96: U256) -> Result<PoolBootstrap> {
        let sqrt_price_x96 = checked_initial_price(sqrt_price_x96);
        let (pool, created) = self.deploy(key).await?;
        let initialized = self
            .initialize(pool, sqrt_price_x96)
            .await
            .map_err(|e| e.after(vec![created.clone()]))?;

        Ok(PoolBootstrap {
            pool,
            sqrt_price_x96,
            steps: vec![created, initialized],
        })
    }

    async fn deploy(&self, key: &PoolKey) -> Result<(Address, OperationResult)> {
        log_pool!("Creating pool {}", key);
        let request = TxRequest::new(self.factory, factory::encode_create_pool(key)?);
        let created = self.executor.execute(StepKind::CreatePool, request).await?;

        // The address always comes from the derivation, never from logs
        let derived = self.pools.pool_address(key);
        let registered = self
            .pools
            .registered_pool(key)
            .await
            .map_err(|e| e.after(vec![created.clone()]))?;
        if registered != derived {
            return Err(EngineError::PoolAddressMismatch {
                derived,
                registered,
            }
            .after(vec![created]));
        }
        Ok((derived, created))
    }

    async fn initialize(&self, pool: Address, sqrt_price_x96: U256) -> Result<OperationResult> {
        log_pool!("Initializing pool {:?} at sqrtPriceX96 {}", pool, sqrt_price_x96);
        let request = TxRequest::new(pool, pool::encode_initialize(sqrt_price_x96)?);
        self.executor.execute(StepKind::InitializePool, request).await
    }
}
