//! # Swap Engine - Quote and Execute
//!
//! ## Purpose
//!
//! Single-hop exact-input swaps through the router, priced by the on-chain
//! quoter. A quote is only requested from a pool that exists and holds
//! liquidity; an empty route is reported as [`QuoteOutcome::NoViableQuote`]
//! rather than an error.
//!
//! ## Execution Flow
//!
//! ```text
//! SwapRequest ──> quote() ──> minimumAmountOut (slippage)
//!                                  │
//!             native input? ── yes ──> value = amountIn
//!                   │ no
//!                   └──> ensure router allowance
//!                                  │
//!                                  ▼
//!                      exactInputSingle(deadline)
//! ```

use crate::approvals::ApprovalOrchestrator;
use crate::engine::EngineSettings;
use crate::error::{EngineError, QuoteFailure, Result};
use crate::executor::{deadline_from_now, OperationResult, StepKind, TransactionExecutor};
use crate::logging::LogEmoji;
use crate::pool_reader::{PoolReader, PoolState};
use crate::provider::{RpcError, TxRequest};
use crate::{log_search, log_success};
use ethereum_types::{Address, U256};
use lp_amm::swap_math::{estimate_fee, estimate_price_impact};
use lp_amm::{AmmError, Decimal, FeeTier};
use lp_config::ChainContracts;
use lp_dex::abi::router::{self, ExactInputSingleParams, QuoteExactInputSingleParams, QuoteOutput};
use lp_dex::{AbiError, PoolKey, Token};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub token_in: Token,
    pub token_out: Token,
    pub fee: FeeTier,
    pub amount_in: U256,
    /// Defaults to the signer
    pub recipient: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub amount_in: U256,
    pub amount_out: U256,
    /// Percent shortfall against the fee-adjusted spot fill
    pub price_impact: Decimal,
    pub fee_amount: U256,
    pub sqrt_price_x96_after: U256,
    pub gas_estimate: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteOutcome {
    Quoted(SwapQuote),
    NoViableQuote { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub quote: SwapQuote,
    pub minimum_amount_out: U256,
    /// Approval (if any) followed by the swap
    pub steps: Vec<OperationResult>,
}

/// Map a failed quoter call onto the quote error taxonomy
fn quote_failure(err: EngineError) -> EngineError {
    match err {
        EngineError::Rpc(RpcError::Reverted { reason }) => QuoteFailure::Reverted {
            reason: reason.unwrap_or_else(|| "no reason".to_string()),
        }
        .into(),
        EngineError::Rpc(RpcError::EmptyResponse)
        | EngineError::Abi(AbiError::EmptyResponse { .. } | AbiError::Decode { .. }) => {
            QuoteFailure::EmptyResponse.into()
        }
        other => other,
    }
}

#[derive(Clone)]
pub struct SwapEngine {
    pools: PoolReader,
    approvals: ApprovalOrchestrator,
    executor: TransactionExecutor,
    router: Address,
    quoter: Address,
    settings: EngineSettings,
}

impl SwapEngine {
    pub fn new(
        pools: PoolReader,
        approvals: ApprovalOrchestrator,
        executor: TransactionExecutor,
        contracts: &ChainContracts,
        settings: EngineSettings,
    ) -> Self {
        Self {
            pools,
            approvals,
            executor,
            router: contracts.swap_router,
            quoter: contracts.quoter,
            settings,
        }
    }

    pub async fn quote(&self, request: &SwapRequest) -> Result<QuoteOutcome> {
        if request.amount_in.is_zero() {
            return Err(AmmError::ZeroAmount {
                context: "swap amount_in".to_string(),
            }
            .into());
        }
        let key = PoolKey::from_tokens(&request.token_in, &request.token_out, request.fee)?;

        let snapshot = self.pools.read(&key).await?;
        let Some(price) = snapshot.price_context() else {
            return Ok(QuoteOutcome::NoViableQuote {
                reason: format!("pool {:?} is {}", snapshot.address, describe(&snapshot.state)),
            });
        };
        if snapshot.liquidity() == 0 {
            return Ok(QuoteOutcome::NoViableQuote {
                reason: format!("pool {:?} has no active liquidity", snapshot.address),
            });
        }

        let output = self.call_quoter(request).await?;
        if output.amount_out.is_zero() {
            return Ok(QuoteOutcome::NoViableQuote {
                reason: "quoter returned zero output".to_string(),
            });
        }

        let zero_for_one = key.zero_for_one(request.token_in.address);
        let quote = SwapQuote {
            amount_in: request.amount_in,
            amount_out: output.amount_out,
            price_impact: estimate_price_impact(
                price.sqrt_price_x96,
                request.fee,
                zero_for_one,
                request.amount_in,
                output.amount_out,
            ),
            fee_amount: estimate_fee(request.amount_in, request.fee),
            sqrt_price_x96_after: output.sqrt_price_x96_after,
            gas_estimate: output.gas_estimate,
        };
        log_search!(
            "Quote {} {} -> {} {} (impact {}%)",
            quote.amount_in,
            request.token_in.symbol,
            quote.amount_out,
            request.token_out.symbol,
            quote.price_impact
        );
        Ok(QuoteOutcome::Quoted(quote))
    }

    async fn call_quoter(&self, request: &SwapRequest) -> Result<QuoteOutput> {
        let params = QuoteExactInputSingleParams {
            token_in: request.token_in.address,
            token_out: request.token_out.address,
            amount_in: request.amount_in,
            fee: request.fee,
            sqrt_price_limit_x96: U256::zero(),
        };
        let raw = self
            .pools
            .call(
                "quoteExactInputSingle",
                self.quoter,
                router::encode_quote_exact_input_single(&params)?,
            )
            .await
            .map_err(quote_failure)?;
        router::decode_quote_exact_input_single(&raw).map_err(|e| quote_failure(e.into()))
    }

    /// Quote, then swap with the slippage-protected minimum output
    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapOutcome> {
        let quote = match self.quote(request).await? {
            QuoteOutcome::Quoted(quote) => quote,
            QuoteOutcome::NoViableQuote { reason } => {
                return Err(EngineError::NoViableQuote { reason })
            }
        };
        let minimum_amount_out = self.settings.slippage.minimum_amount(quote.amount_out)?;
        debug!(
            "Swap {} for at least {} (quoted {})",
            quote.amount_in, minimum_amount_out, quote.amount_out
        );

        let mut steps = Vec::new();
        let value = if request.token_in.is_native {
            info!(
                "{} Paying {} native {} with the swap",
                LogEmoji::SWAP,
                quote.amount_in,
                request.token_in.symbol
            );
            quote.amount_in
        } else {
            steps.extend(
                self.approvals
                    .ensure_allowance(&request.token_in, self.router, quote.amount_in)
                    .await?,
            );
            U256::zero()
        };

        let params = ExactInputSingleParams {
            token_in: request.token_in.address,
            token_out: request.token_out.address,
            fee: request.fee,
            recipient: request.recipient.unwrap_or_else(|| self.executor.owner()),
            deadline: deadline_from_now(self.settings.deadline_secs),
            amount_in: quote.amount_in,
            amount_out_minimum: minimum_amount_out,
            sqrt_price_limit_x96: U256::zero(),
        };
        let encoded = router::encode_exact_input_single(&params)
            .map_err(|e| EngineError::from(e).after(steps.clone()))?;
        let request = TxRequest::new(self.router, encoded).with_value(value);
        let swapped = self
            .executor
            .execute(StepKind::Swap, request)
            .await
            .map_err(|e| e.after(steps.clone()))?;
        steps.push(swapped);

        log_success!(
            "{} Swapped {} for at least {}",
            LogEmoji::SWAP,
            quote.amount_in,
            minimum_amount_out
        );
        Ok(SwapOutcome {
            quote,
            minimum_amount_out,
            steps,
        })
    }
}

fn describe(state: &PoolState) -> &'static str {
    match state {
        PoolState::Missing => "not deployed",
        PoolState::Uninitialized => "not initialized",
        PoolState::Active { .. } => "active",
    }
}
