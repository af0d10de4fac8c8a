//! # Ethers Chain - JSON-RPC Collaborator
//!
//! ## Purpose
//!
//! Implements [`ChainReader`] and [`TransactionSigner`] over an HTTP JSON-RPC
//! endpoint using `ethers`. Reads are `eth_call` against the latest block;
//! writes are signed locally by a [`LocalWallet`] through
//! [`SignerMiddleware`], which also fills nonce and gas.
//!
//! ## Error Mapping
//!
//! | Node response                               | [`RpcError`]           |
//! |---------------------------------------------|------------------------|
//! | code 3, "execution reverted"                | `Reverted` (decoded)   |
//! | -32005, HTTP 429, "rate limit"              | `RateLimited`          |
//! | -32600 / -32601 / -32602                    | `UnsupportedMethod`    |
//! | other JSON-RPC error on send                | `Submission`           |
//! | connection, HTTP and decode failures        | `Transport`            |
//!
//! ## Receipts
//!
//! Receipts are polled at a fixed interval until mined or the configured
//! timeout passes. A failed receipt is replayed as an `eth_call` at its block
//! to recover the revert reason.

use crate::logging::LogEmoji;
use crate::provider::{ChainReader, RpcError, TransactionSigner, TxReceipt, TxRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{BlockId, BlockNumber, TransactionReceipt, TransactionRequest, U64};
use ethereum_types::{Address, H256};
use lp_config::ReceiptSettings;
use lp_dex::{decode_revert_reason, LogEntry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const REVERT_CODE: i64 = 3;
const LIMIT_EXCEEDED_CODE: i64 = -32005;
const INVALID_REQUEST_CODES: [i64; 3] = [-32600, -32601, -32602];

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct EthersChain {
    provider: Arc<Provider<Http>>,
    signer: Option<SignerClient>,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl EthersChain {
    /// Reader only; `submit` fails with [`RpcError::Signer`]
    pub fn read_only(rpc_url: &str, receipts: &ReceiptSettings) -> Result<Self> {
        Ok(Self {
            provider: Arc::new(build_provider(rpc_url)?),
            signer: None,
            poll_interval: Duration::from_millis(receipts.poll_interval_ms),
            receipt_timeout: Duration::from_secs(receipts.timeout_secs),
        })
    }

    pub fn with_signer(
        rpc_url: &str,
        private_key: &str,
        chain_id: u64,
        receipts: &ReceiptSettings,
    ) -> Result<Self> {
        let mut chain = Self::read_only(rpc_url, receipts)?;
        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .context("Invalid private key format")?
            .with_chain_id(chain_id);
        info!("{} Signer {:?} on chain {}", LogEmoji::EXECUTE, wallet.address(), chain_id);
        chain.signer = Some(SignerMiddleware::new((*chain.provider).clone(), wallet));
        Ok(chain)
    }

    /// Re-run a failed transaction at its block to recover the reason
    async fn replay_revert_reason(&self, receipt: &TransactionReceipt) -> Option<String> {
        let tx = match self.provider.get_transaction(receipt.transaction_hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => return None,
            Err(e) => {
                debug!("Could not fetch reverted transaction: {}", e);
                return None;
            }
        };

        let mut call = TransactionRequest::new().from(tx.from).data(tx.input).value(tx.value);
        if let Some(to) = tx.to {
            call = call.to(to);
        }
        let block = receipt
            .block_number
            .map(|n| BlockId::Number(BlockNumber::Number(n)));

        match self.provider.call(&TypedTransaction::Legacy(call), block).await {
            Ok(_) => None,
            Err(e) => match classify(&e, RpcError::Transport) {
                RpcError::Reverted { reason } => reason,
                _ => None,
            },
        }
    }
}

fn build_provider(rpc_url: &str) -> Result<Provider<Http>> {
    let http_client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(5)
        .timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .context("Failed to create HTTP client")?;
    let url: Url = rpc_url.parse().context("Invalid RPC URL")?;
    Ok(Provider::new(Http::new_with_client(url, http_client)))
}

/// Classify a middleware error; `fallback` covers JSON-RPC errors that are
/// neither reverts, limits nor malformed requests
fn classify<E: MiddlewareError>(err: &E, fallback: fn(String) -> RpcError) -> RpcError {
    if let Some(response) = err.as_error_response() {
        let message = response.message.clone();
        let lower = message.to_lowercase();
        if response.code == REVERT_CODE || lower.contains("revert") {
            let reason = response
                .as_revert_data()
                .and_then(|data| decode_revert_reason(&data))
                .or_else(|| {
                    message
                        .strip_prefix("execution reverted: ")
                        .map(str::to_string)
                });
            return RpcError::Reverted { reason };
        }
        if response.code == LIMIT_EXCEEDED_CODE || lower.contains("rate limit") {
            return RpcError::RateLimited(message);
        }
        if INVALID_REQUEST_CODES.contains(&response.code) {
            return RpcError::UnsupportedMethod(message);
        }
        return fallback(message);
    }

    let message = err.to_string();
    if message.contains("429") || message.to_lowercase().contains("too many requests") {
        RpcError::RateLimited(message)
    } else {
        RpcError::Transport(message)
    }
}

fn to_log_entry(log: &ethers::types::Log) -> LogEntry {
    LogEntry {
        address: log.address,
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    }
}

#[async_trait]
impl ChainReader for EthersChain {
    async fn call(&self, to: Address, data: Vec<u8>) -> std::result::Result<Vec<u8>, RpcError> {
        let request = TransactionRequest::new().to(to).data(data);
        self.provider
            .call(&TypedTransaction::Legacy(request), None)
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| classify(&e, RpcError::Transport))
    }
}

#[async_trait]
impl TransactionSigner for EthersChain {
    fn address(&self) -> Address {
        self.signer
            .as_ref()
            .map(|client| client.address())
            .unwrap_or_default()
    }

    async fn submit(&self, tx: TxRequest) -> std::result::Result<H256, RpcError> {
        let client = self
            .signer
            .as_ref()
            .ok_or_else(|| RpcError::Signer("no signing key configured".to_string()))?;

        let request = TransactionRequest::new()
            .from(client.address())
            .to(tx.to)
            .data(tx.data)
            .value(tx.value);
        let pending = client
            .send_transaction(request, None)
            .await
            .map_err(|e| classify(&e, RpcError::Submission))?;
        Ok(pending.tx_hash())
    }

    async fn await_receipt(&self, tx_hash: H256) -> std::result::Result<TxReceipt, RpcError> {
        debug!("{} Monitoring confirmation for tx: {:?}", LogEmoji::CLOCK, tx_hash);
        let started = Instant::now();

        let receipt = loop {
            if started.elapsed() > self.receipt_timeout {
                return Err(RpcError::Timeout(format!(
                    "no receipt for {:?} after {}s",
                    tx_hash,
                    self.receipt_timeout.as_secs()
                )));
            }
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => break receipt,
                Ok(None) => {}
                Err(e) => warn!("Error checking transaction receipt: {}", e),
            }
            tokio::time::sleep(self.poll_interval).await;
        };

        let success = receipt.status == Some(U64::one());
        let revert_reason = if success {
            None
        } else {
            self.replay_revert_reason(&receipt).await
        };

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            success,
            gas_used: receipt.gas_used,
            logs: receipt.logs.iter().map(to_log_entry).collect(),
            revert_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_chain_has_no_signer() {
        let chain = EthersChain::read_only("http://127.0.0.1:8545", &ReceiptSettings::default()).unwrap();
        assert_eq!(TransactionSigner::address(&chain), Address::zero());
    }

    #[tokio::test]
    async fn test_submit_without_key_is_signer_error() {
        let chain = EthersChain::read_only("http://127.0.0.1:8545", &ReceiptSettings::default()).unwrap();
        let err = chain
            .submit(TxRequest::new(Address::zero(), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Signer(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(EthersChain::read_only("not a url", &ReceiptSettings::default()).is_err());
    }

    #[test]
    fn test_signer_address_from_key() {
        // Well-known development key
        let chain = EthersChain::with_signer(
            "http://127.0.0.1:8545",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            31337,
            &ReceiptSettings::default(),
        )
        .unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(TransactionSigner::address(&chain), expected);
    }
}
