//! Engine error taxonomy
//!
//! Validation failures never reach the network. Transient RPC failures are
//! retried and only surface as `RetriesExhausted`; reverts surface at once.

use crate::executor::{OperationResult, StepKind};
use crate::provider::RpcError;
use ethereum_types::{Address, H256, U256};
use lp_amm::AmmError;
use lp_dex::AbiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(#[from] AmmError),

    #[error("Unexpected contract response: {0}")]
    Abi(#[from] AbiError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Pool {pool:?} already exists (initialized: {initialized})")]
    PoolAlreadyExists { pool: Address, initialized: bool },

    #[error("Pool {pool:?} does not exist")]
    PoolNotFound { pool: Address },

    #[error("Pool {pool:?} exists but has no price")]
    PoolNotInitialized { pool: Address },

    /// Derived and factory-registered addresses disagree, which means the
    /// configured init-code hash is wrong for this factory
    #[error("Derived pool address {derived:?} does not match factory getPool {registered:?}")]
    PoolAddressMismatch { derived: Address, registered: Address },

    #[error("Quote failed: {0}")]
    Quote(#[from] QuoteFailure),

    #[error("No viable quote: {reason}")]
    NoViableQuote { reason: String },

    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: RpcError,
    },

    #[error("{step} transaction {tx_hash:?} reverted: {reason}")]
    TransactionReverted {
        step: StepKind,
        tx_hash: H256,
        reason: String,
    },

    #[error("Mint transaction {tx_hash:?} emitted no IncreaseLiquidity event")]
    MissingMintEvent { tx_hash: H256 },

    #[error("Position {token_id} not found")]
    PositionNotFound { token_id: U256 },

    /// A later step failed after earlier transactions were confirmed
    #[error("{source} (after {} confirmed steps)", .completed.len())]
    Partial {
        completed: Vec<OperationResult>,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attach already-confirmed steps to a failure so callers can see what
    /// landed on-chain
    pub fn after(self, completed: Vec<OperationResult>) -> Self {
        if completed.is_empty() {
            return self;
        }
        match self {
            EngineError::Partial {
                completed: mut inner,
                source,
            } => {
                let mut all = completed;
                all.append(&mut inner);
                EngineError::Partial {
                    completed: all,
                    source,
                }
            }
            other => EngineError::Partial {
                completed,
                source: Box::new(other),
            },
        }
    }

    /// The underlying failure with any partial-progress wrapper removed
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::Partial { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Failures of the quoter call itself
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuoteFailure {
    #[error("quoter reverted: {reason}")]
    Reverted { reason: String },

    #[error("quoter returned empty or undecodable data")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, EngineError>;
