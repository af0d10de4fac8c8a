//! Position enumeration through the position manager's ERC-721 interface

use crate::error::{EngineError, Result};
use crate::log_search;
use crate::provider::{ChainReader, RpcError};
use crate::retry::RetryPolicy;
use ethereum_types::{Address, U256};
use futures::future::try_join_all;
use lp_amm::{AmmError, FeeTier, TickRange};
use lp_dex::abi::{erc20, position_manager};
use lp_dex::abi::position_manager::PositionInfo;
use lp_dex::PoolKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A position as reported by the position manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub token_id: U256,
    pub owner: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl Position {
    pub fn from_info(token_id: U256, owner: Address, info: PositionInfo) -> Self {
        Self {
            token_id,
            owner,
            token0: info.token0,
            token1: info.token1,
            fee: info.fee,
            tick_lower: info.tick_lower,
            tick_upper: info.tick_upper,
            liquidity: info.liquidity,
            tokens_owed0: info.tokens_owed0,
            tokens_owed1: info.tokens_owed1,
        }
    }

    pub fn belongs_to(&self, key: &PoolKey) -> bool {
        self.token0 == key.token0 && self.token1 == key.token1 && self.fee == key.fee.fee()
    }

    pub fn pool_key(&self) -> std::result::Result<PoolKey, AmmError> {
        PoolKey::new(self.token0, self.token1, FeeTier::from_fee(self.fee)?)
    }

    pub fn range(&self) -> std::result::Result<TickRange, AmmError> {
        let spacing = FeeTier::from_fee(self.fee)?.tick_spacing();
        TickRange::new(self.tick_lower, self.tick_upper, spacing)
    }

    /// Nothing left to withdraw: burnable
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed0 == 0 && self.tokens_owed1 == 0
    }
}

#[derive(Clone)]
pub struct PositionReader {
    reader: Arc<dyn ChainReader>,
    position_manager: Address,
    retry: RetryPolicy,
}

impl PositionReader {
    pub fn new(reader: Arc<dyn ChainReader>, position_manager: Address, retry: RetryPolicy) -> Self {
        Self {
            reader,
            position_manager,
            retry,
        }
    }

    async fn call(&self, operation: &str, data: Vec<u8>) -> Result<Vec<u8>> {
        let reader = &self.reader;
        let to = self.position_manager;
        self.retry
            .run(operation, || reader.call(to, data.clone()))
            .await
    }

    /// Number of positions held by `owner`
    pub async fn balance_of(&self, owner: Address) -> Result<u64> {
        let raw = self.call("balanceOf", erc20::encode_balance_of(owner)?).await?;
        let balance = erc20::decode_balance_of(&raw)?;
        Ok(if balance > U256::from(u64::MAX) {
            u64::MAX
        } else {
            balance.as_u64()
        })
    }

    pub async fn token_of_owner_by_index(&self, owner: Address, index: u64) -> Result<U256> {
        let raw = self
            .call(
                "tokenOfOwnerByIndex",
                position_manager::encode_token_of_owner_by_index(owner, index)?,
            )
            .await?;
        Ok(position_manager::decode_token_of_owner_by_index(&raw)?)
    }

    /// `positions(tokenId)`; the manager reverts for unknown ids
    pub async fn position_info(&self, token_id: U256) -> Result<PositionInfo> {
        let raw = match self
            .call("positions", position_manager::encode_positions(token_id)?)
            .await
        {
            Ok(raw) => raw,
            Err(EngineError::Rpc(RpcError::Reverted { .. })) => {
                return Err(EngineError::PositionNotFound { token_id })
            }
            Err(e) => return Err(e),
        };
        Ok(position_manager::decode_positions(&raw)?)
    }

    /// Every position `owner` holds. Index and position reads are issued
    /// concurrently.
    pub async fn positions_of(&self, owner: Address) -> Result<Vec<Position>> {
        let count = self.balance_of(owner).await?;
        log_search!("{:?} holds {} positions", owner, count);

        let token_ids =
            try_join_all((0..count).map(|index| self.token_of_owner_by_index(owner, index))).await?;
        let infos = try_join_all(token_ids.iter().map(|id| self.position_info(*id))).await?;

        Ok(token_ids
            .into_iter()
            .zip(infos)
            .map(|(token_id, info)| Position::from_info(token_id, owner, info))
            .collect())
    }

    pub async fn positions_for_pool(&self, owner: Address, key: &PoolKey) -> Result<Vec<Position>> {
        Ok(self
            .positions_of(owner)
            .await?
            .into_iter()
            .filter(|position| position.belongs_to(key))
            .collect())
    }
}
