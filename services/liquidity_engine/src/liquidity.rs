//! # Liquidity Mutator - Mint, Collect, Remove
//!
//! ## Purpose
//!
//! Drives the position manager through a position's lifecycle. Minting is a
//! single transaction preceded by wrap/approve preparation. Removal is the
//! three-transaction sequence decrease, collect, burn, modelled as an
//! explicit state machine ([`RemoveLiquidity`]) that can be persisted and
//! resumed.
//!
//! ## Resumption
//!
//! ```text
//! Decreasing ──confirmed──> Collecting ──confirmed──> Burning ──confirmed──> Done
//!     │                         │                        │
//!     └─ failure: stay ─────────┴─ failure: stay ────────┘
//! ```
//!
//! A submitted hash is recorded in `pending` before its receipt is awaited.
//! Resuming with a pending hash awaits that transaction rather than sending
//! the step again; a revert clears it so the step is retried fresh.

use crate::approvals::{ApprovalOrchestrator, TokenRequirement};
use crate::engine::EngineSettings;
use crate::error::{EngineError, Result};
use crate::executor::{deadline_from_now, OperationResult, StepKind, TransactionExecutor};
use crate::pool_reader::PoolReader;
use crate::positions::PositionReader;
use crate::provider::TxRequest;
use crate::{log_search, log_success};
use ethereum_types::{Address, H256, U256};
use lp_amm::{amounts_for_position, AmmError, FeeTier, PositionBuilder, PositionKind, TickRange};
use lp_config::ChainContracts;
use lp_dex::abi::erc20;
use lp_dex::abi::position_manager::{
    self, CollectParams, DecreaseLiquidityParams, MintParams, PositionInfo,
};
use lp_dex::{sort_tokens, PoolKey, Token};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A new position to open
#[derive(Debug, Clone, PartialEq)]
pub struct MintRequest {
    pub token_a: Token,
    pub token_b: Token,
    pub fee: FeeTier,
    pub kind: PositionKind,
    pub amount_a: U256,
    pub amount_b: U256,
    /// Defaults to the signer
    pub recipient: Option<Address>,
    /// Fund native-token legs by wrapping native currency
    pub wrap_native: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    pub token_id: U256,
    pub pool: Address,
    pub range: TickRange,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
    /// Preparation steps followed by the mint itself
    pub steps: Vec<OperationResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectOutcome {
    pub steps: Vec<OperationResult>,
    /// Wrapped-native amount withdrawn to native currency
    pub unwrapped: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveStage {
    Decreasing,
    Collecting,
    Burning,
    Done,
}

impl RemoveStage {
    fn step(self) -> Option<StepKind> {
        match self {
            RemoveStage::Decreasing => Some(StepKind::DecreaseLiquidity),
            RemoveStage::Collecting => Some(StepKind::Collect),
            RemoveStage::Burning => Some(StepKind::Burn),
            RemoveStage::Done => None,
        }
    }

    fn next(self) -> Self {
        match self {
            RemoveStage::Decreasing => RemoveStage::Collecting,
            RemoveStage::Collecting => RemoveStage::Burning,
            RemoveStage::Burning | RemoveStage::Done => RemoveStage::Done,
        }
    }
}

/// Persistable progress of closing a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidity {
    pub token_id: U256,
    pub stage: RemoveStage,
    /// Submitted for the current stage, receipt not yet seen
    pub pending: Option<H256>,
    pub completed: Vec<OperationResult>,
}

impl RemoveLiquidity {
    pub fn new(token_id: U256) -> Self {
        Self {
            token_id,
            stage: RemoveStage::Decreasing,
            pending: None,
            completed: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == RemoveStage::Done
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Clone)]
pub struct LiquidityManager {
    pools: PoolReader,
    positions: PositionReader,
    approvals: ApprovalOrchestrator,
    executor: TransactionExecutor,
    position_manager: Address,
    wrapped_native: Address,
    settings: EngineSettings,
}

impl LiquidityManager {
    pub fn new(
        pools: PoolReader,
        positions: PositionReader,
        approvals: ApprovalOrchestrator,
        executor: TransactionExecutor,
        contracts: &ChainContracts,
        settings: EngineSettings,
    ) -> Self {
        Self {
            pools,
            positions,
            approvals,
            executor,
            position_manager: contracts.position_manager,
            wrapped_native: contracts.wrapped_native,
            settings,
        }
    }

    fn deadline(&self) -> U256 {
        deadline_from_now(self.settings.deadline_secs)
    }

    /// Open a position: plan the range and liquidity at the current price,
    /// prepare allowances, then mint
    pub async fn mint(&self, request: &MintRequest) -> Result<MintOutcome> {
        if request.amount_a.is_zero() && request.amount_b.is_zero() {
            return Err(AmmError::ZeroAmount {
                context: "mint with no tokens".to_string(),
            }
            .into());
        }
        let key = PoolKey::from_tokens(&request.token_a, &request.token_b, request.fee)?;
        let builder = PositionBuilder::new(request.fee, self.settings.single_sided_width)?;
        // Everything but single-sided placement is checked before touching the chain
        builder.fixed_range(request.kind)?;
        let (token0, token1) = sort_tokens(&request.token_a, &request.token_b);
        let (desired0, desired1) = if token0.address == request.token_a.address {
            (request.amount_a, request.amount_b)
        } else {
            (request.amount_b, request.amount_a)
        };

        let snapshot = self.pools.read(&key).await?;
        let price = snapshot.require_active()?;
        let plan = builder.plan(request.kind, price, desired0, desired1)?;

        let requirements = [
            TokenRequirement::new(token0.clone(), plan.amount0).wrapping(request.wrap_native),
            TokenRequirement::new(token1.clone(), plan.amount1).wrapping(request.wrap_native),
        ];
        let mut steps = self.approvals.prepare(&requirements, self.position_manager).await?;

        let slippage = self.settings.slippage;
        let params = MintParams {
            token0: key.token0,
            token1: key.token1,
            fee: key.fee,
            tick_lower: plan.range.lower,
            tick_upper: plan.range.upper,
            amount0_desired: plan.amount0,
            amount1_desired: plan.amount1,
            amount0_min: slippage.minimum_amount(plan.amount0)?,
            amount1_min: slippage.minimum_amount(plan.amount1)?,
            recipient: request.recipient.unwrap_or_else(|| self.executor.owner()),
            deadline: self.deadline(),
        };
        debug!("Mint params: {:?}", params);

        let encoded = position_manager::encode_mint(&params).map_err(|e| EngineError::from(e).after(steps.clone()))?;
        let minted = self
            .executor
            .execute(StepKind::Mint, TxRequest::new(self.position_manager, encoded))
            .await
            .map_err(|e| e.after(steps.clone()))?;
        steps.push(minted.clone());

        let event = match position_manager::find_minted_position(self.position_manager, &minted.receipt.logs) {
            Ok(Some(event)) => event,
            Ok(None) => {
                return Err(EngineError::MissingMintEvent {
                    tx_hash: minted.tx_hash,
                }
                .after(steps))
            }
            Err(e) => return Err(EngineError::from(e).after(steps)),
        };

        log_success!(
            "Minted position {} in [{}, {}) with liquidity {}",
            event.token_id,
            plan.range.lower,
            plan.range.upper,
            event.liquidity
        );
        Ok(MintOutcome {
            token_id: event.token_id,
            pool: snapshot.address,
            range: plan.range,
            liquidity: event.liquidity,
            amount0: event.amount0,
            amount1: event.amount1,
            steps,
        })
    }

    /// Collect all owed fees; optionally unwrap any wrapped-native balance
    pub async fn collect_fees(&self, token_id: U256, unwrap_native: bool) -> Result<CollectOutcome> {
        let owner = self.executor.owner();
        let collected = self.execute_collect(token_id, owner).await?;
        let mut steps = vec![collected];

        if !unwrap_native {
            return Ok(CollectOutcome {
                steps,
                unwrapped: None,
            });
        }

        let balance = self
            .approvals
            .balance_of(self.wrapped_native, owner)
            .await
            .map_err(|e| e.after(steps.clone()))?;
        if balance.is_zero() {
            debug!("No wrapped native balance to unwrap");
            return Ok(CollectOutcome {
                steps,
                unwrapped: None,
            });
        }

        let request = TxRequest::new(
            self.wrapped_native,
            erc20::encode_withdraw(balance).map_err(|e| EngineError::from(e).after(steps.clone()))?,
        );
        let unwrapped = self
            .executor
            .execute(StepKind::Unwrap, request)
            .await
            .map_err(|e| e.after(steps.clone()))?;
        steps.push(unwrapped);

        Ok(CollectOutcome {
            steps,
            unwrapped: Some(balance),
        })
    }

    async fn execute_collect(&self, token_id: U256, recipient: Address) -> Result<OperationResult> {
        let params = CollectParams::all(token_id, recipient);
        let request = TxRequest::new(self.position_manager, position_manager::encode_collect(&params)?);
        self.executor.execute(StepKind::Collect, request).await
    }

    /// Advance `progress` to `Done`. On failure the stage is left at the
    /// failed step; calling again resumes there.
    pub async fn remove_liquidity(&self, progress: &mut RemoveLiquidity) -> Result<()> {
        while let Some(step) = progress.stage.step() {
            let tx_hash = match progress.pending {
                Some(tx_hash) => {
                    debug!("Resuming {} with pending {:?}", step, tx_hash);
                    tx_hash
                }
                None => {
                    let Some(request) = self.removal_request(progress).await? else {
                        log_search!("Position {} has no liquidity, skipping {}", progress.token_id, step);
                        progress.stage = progress.stage.next();
                        continue;
                    };
                    let tx_hash = self.executor.submit(step, request).await?;
                    progress.pending = Some(tx_hash);
                    tx_hash
                }
            };

            match self.executor.confirm(step, tx_hash).await {
                Ok(result) => {
                    progress.pending = None;
                    progress.completed.push(result);
                    progress.stage = progress.stage.next();
                }
                Err(e @ EngineError::TransactionReverted { .. }) => {
                    progress.pending = None;
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        log_success!("Position {} closed", progress.token_id);
        Ok(())
    }

    /// Transaction for the current stage; `None` when it can be skipped
    async fn removal_request(&self, progress: &RemoveLiquidity) -> Result<Option<TxRequest>> {
        let token_id = progress.token_id;
        let data = match progress.stage {
            RemoveStage::Decreasing => {
                let info = self.positions.position_info(token_id).await?;
                if info.liquidity == 0 {
                    return Ok(None);
                }
                let params = self.decrease_params(token_id, &info).await?;
                position_manager::encode_decrease_liquidity(&params)?
            }
            RemoveStage::Collecting => {
                position_manager::encode_collect(&CollectParams::all(token_id, self.executor.owner()))?
            }
            RemoveStage::Burning => position_manager::encode_burn(token_id)?,
            RemoveStage::Done => return Ok(None),
        };
        Ok(Some(TxRequest::new(self.position_manager, data)))
    }

    /// Decrease minimums from the position's value at the current price
    async fn decrease_params(&self, token_id: U256, info: &PositionInfo) -> Result<DecreaseLiquidityParams> {
        let tier = FeeTier::from_fee(info.fee)?;
        let key = PoolKey::new(info.token0, info.token1, tier)?;
        let price = self.pools.read(&key).await?.require_active()?;
        let range = TickRange::new(info.tick_lower, info.tick_upper, tier.tick_spacing())?;
        let (amount0, amount1) = amounts_for_position(range, price.sqrt_price_x96, info.liquidity)?;

        let slippage = self.settings.slippage;
        Ok(DecreaseLiquidityParams {
            token_id,
            liquidity: info.liquidity,
            amount0_min: slippage.minimum_amount(amount0)?,
            amount1_min: slippage.minimum_amount(amount1)?,
            deadline: self.deadline(),
        })
    }
}
