//! # Transaction Executor - Submit, Confirm, Record
//!
//! ## Purpose
//!
//! Single path by which every state-changing step reaches the chain. Each
//! step is submitted through the signer, awaited to inclusion and recorded
//! as an [`OperationResult`]; a mined-but-reverted transaction becomes
//! [`EngineError::TransactionReverted`] carrying the decoded reason.
//!
//! ## Architecture Role
//!
//! ```text
//! Approvals / Factory / Liquidity / Swap
//!                  │ TxRequest
//!                  ▼
//!        [submit] ──retry──> TransactionSigner::submit ──> tx hash
//!                  │
//!        [confirm] ──retry──> TransactionSigner::await_receipt
//!                  │
//!                  ▼
//!           OperationResult { step, tx_hash, receipt }
//! ```
//!
//! Submission and confirmation are exposed separately so a resumable
//! sequence can persist the hash in between and, after a crash, await the
//! same transaction instead of sending a second one.

use crate::error::{EngineError, Result};
use crate::logging::{step_emoji, LogEmoji};
use crate::provider::{TransactionSigner, TxReceipt, TxRequest};
use crate::retry::RetryPolicy;
use crate::{log_error, log_execution, log_success};
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Kind of on-chain step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Wrap,
    Approve,
    CreatePool,
    InitializePool,
    Mint,
    DecreaseLiquidity,
    Collect,
    Burn,
    Unwrap,
    Swap,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Wrap => "wrap",
            StepKind::Approve => "approve",
            StepKind::CreatePool => "create pool",
            StepKind::InitializePool => "initialize pool",
            StepKind::Mint => "mint",
            StepKind::DecreaseLiquidity => "decrease liquidity",
            StepKind::Collect => "collect",
            StepKind::Burn => "burn",
            StepKind::Unwrap => "unwrap",
            StepKind::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// One confirmed step of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub step: StepKind,
    pub tx_hash: H256,
    pub receipt: TxReceipt,
}

/// On-chain deadline `secs` from now
pub fn deadline_from_now(secs: u64) -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    U256::from(now.saturating_add(secs))
}

#[derive(Clone)]
pub struct TransactionExecutor {
    signer: Arc<dyn TransactionSigner>,
    retry: RetryPolicy,
}

impl TransactionExecutor {
    pub fn new(signer: Arc<dyn TransactionSigner>, retry: RetryPolicy) -> Self {
        Self { signer, retry }
    }

    /// Account that signs every step
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub async fn submit(&self, step: StepKind, request: TxRequest) -> Result<H256> {
        debug!(
            "Submitting {} to {:?} ({} bytes, value {})",
            step,
            request.to,
            request.data.len(),
            request.value
        );
        let signer = &self.signer;
        let tx_hash = self
            .retry
            .run(&format!("submit {}", step), || signer.submit(request.clone()))
            .await?;
        log_execution!("{} {} submitted: {:?}", step_emoji(step), step, tx_hash);
        Ok(tx_hash)
    }

    /// Await a submitted step; a reverted receipt is an error
    pub async fn confirm(&self, step: StepKind, tx_hash: H256) -> Result<OperationResult> {
        let started = Instant::now();
        debug!("{} Awaiting receipt for {} {:?}", LogEmoji::CLOCK, step, tx_hash);

        let signer = &self.signer;
        let receipt = self
            .retry
            .run(&format!("await {}", step), || signer.await_receipt(tx_hash))
            .await?;

        if !receipt.success {
            let reason = receipt
                .revert_reason
                .clone()
                .unwrap_or_else(|| "no reason".to_string());
            log_error!("{} {:?} reverted: {}", step, tx_hash, reason);
            return Err(EngineError::TransactionReverted {
                step,
                tx_hash,
                reason,
            });
        }

        log_success!(
            "{} {} confirmed in block {:?} after {}ms: {:?}",
            step_emoji(step),
            step,
            receipt.block_number,
            started.elapsed().as_millis(),
            tx_hash
        );
        Ok(OperationResult {
            step,
            tx_hash,
            receipt,
        })
    }

    pub async fn execute(&self, step: StepKind, request: TxRequest) -> Result<OperationResult> {
        let tx_hash = self.submit(step, request).await?;
        self.confirm(step, tx_hash).await
    }
}
