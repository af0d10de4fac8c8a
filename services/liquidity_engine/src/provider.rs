//! Chain collaborator boundary
//!
//! The engine never talks to a node directly. Reads go through
//! [`ChainReader`], writes through [`TransactionSigner`], and bootstrap
//! prices come from a [`PriceSource`]. Nonce management and signing belong
//! to the signer implementation.

use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use lp_dex::{LogEntry, Token};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An unsigned call or transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
}

impl TxRequest {
    pub fn new(to: Address, data: Vec<u8>) -> Self {
        Self {
            to,
            data,
            value: U256::zero(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Mined transaction outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub success: bool,
    pub gas_used: Option<U256>,
    pub logs: Vec<LogEntry>,
    /// Decoded reason for failed transactions when the node could replay it
    pub revert_reason: Option<String>,
}

impl TxReceipt {
    pub fn succeeded(tx_hash: H256, logs: Vec<LogEntry>) -> Self {
        Self {
            tx_hash,
            block_number: None,
            success: true,
            gas_used: None,
            logs,
            revert_reason: None,
        }
    }

    pub fn reverted(tx_hash: H256, reason: Option<String>) -> Self {
        Self {
            tx_hash,
            block_number: None,
            success: false,
            gas_used: None,
            logs: Vec::new(),
            revert_reason: reason,
        }
    }
}

/// Classified RPC failure
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpcError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("malformed request or unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("execution reverted: {}", .reason.as_deref().unwrap_or("no reason"))]
    Reverted { reason: Option<String> },

    #[error("empty response")]
    EmptyResponse,

    #[error("signer unavailable: {0}")]
    Signer(String),
}

impl RpcError {
    /// Failures worth retrying. Reverts are deterministic and signer
    /// problems will not fix themselves.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RpcError::RateLimited(_)
                | RpcError::UnsupportedMethod(_)
                | RpcError::Submission(_)
                | RpcError::Transport(_)
                | RpcError::Timeout(_)
        )
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, RpcError::Reverted { .. })
    }
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError>;
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Account that signs, owns positions and receives funds
    fn address(&self) -> Address;

    async fn submit(&self, tx: TxRequest) -> Result<H256, RpcError>;

    /// Wait until the transaction is mined. A reverted transaction is a
    /// receipt with `success == false`, not an error.
    async fn await_receipt(&self, tx_hash: H256) -> Result<TxReceipt, RpcError>;
}

/// External price feed used to seed new pools
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-unit price of `base` denominated in `quote`
    async fn price(&self, base: &Token, quote: &Token) -> Result<f64, RpcError>;
}

/// A fixed price, for pools whose starting price is decided off-chain
#[derive(Debug, Clone, Copy)]
pub struct FixedPrice(pub f64);

#[async_trait]
impl PriceSource for FixedPrice {
    async fn price(&self, _base: &Token, _quote: &Token) -> Result<f64, RpcError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RpcError::RateLimited("429".into()).is_transient());
        assert!(RpcError::UnsupportedMethod("-32601".into()).is_transient());
        assert!(RpcError::Submission("nonce too low".into()).is_transient());
        assert!(RpcError::Transport("reset".into()).is_transient());
        assert!(!RpcError::Reverted { reason: None }.is_transient());
        assert!(!RpcError::EmptyResponse.is_transient());
        assert!(!RpcError::Signer("read-only".into()).is_transient());
    }

    #[test]
    fn test_revert_display() {
        let err = RpcError::Reverted {
            reason: Some("STF".into()),
        };
        assert_eq!(err.to_string(), "execution reverted: STF");
        assert_eq!(
            RpcError::Reverted { reason: None }.to_string(),
            "execution reverted: no reason"
        );
    }
}
