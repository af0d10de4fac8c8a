//! Allowance and native-wrapping preparation
//!
//! Every check reads current chain state first and only transacts on a
//! shortfall, so running the same preparation twice issues nothing the
//! second time.

use crate::error::Result;
use crate::executor::{OperationResult, StepKind, TransactionExecutor};
use crate::provider::{ChainReader, TxRequest};
use crate::retry::RetryPolicy;
use ethereum_types::{Address, U256};
use lp_dex::abi::erc20;
use lp_dex::Token;
use std::sync::Arc;
use tracing::debug;

/// One token an operation will pull from the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequirement {
    pub token: Token,
    pub amount: U256,
    /// Fund a native token's wrapped balance from native currency
    pub wrap_native: bool,
}

impl TokenRequirement {
    pub fn new(token: Token, amount: U256) -> Self {
        Self {
            token,
            amount,
            wrap_native: false,
        }
    }

    pub fn wrapping(mut self, wrap_native: bool) -> Self {
        self.wrap_native = wrap_native && self.token.is_native;
        self
    }
}

#[derive(Clone)]
pub struct ApprovalOrchestrator {
    reader: Arc<dyn ChainReader>,
    executor: TransactionExecutor,
    retry: RetryPolicy,
}

impl ApprovalOrchestrator {
    pub fn new(reader: Arc<dyn ChainReader>, executor: TransactionExecutor, retry: RetryPolicy) -> Self {
        Self {
            reader,
            executor,
            retry,
        }
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let reader = &self.reader;
        let data = erc20::encode_balance_of(owner)?;
        let raw = self
            .retry
            .run("balanceOf", || reader.call(token, data.clone()))
            .await?;
        Ok(erc20::decode_balance_of(&raw)?)
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let reader = &self.reader;
        let data = erc20::encode_allowance(owner, spender)?;
        let raw = self
            .retry
            .run("allowance", || reader.call(token, data.clone()))
            .await?;
        Ok(erc20::decode_allowance(&raw)?)
    }

    /// Deposit native currency until the wrapped balance covers `amount`
    pub async fn ensure_wrapped(&self, token: &Token, amount: U256) -> Result<Option<OperationResult>> {
        if !token.is_native || amount.is_zero() {
            return Ok(None);
        }
        let owner = self.executor.owner();
        let balance = self.balance_of(token.address, owner).await?;
        if balance >= amount {
            debug!("Wrapped {} balance {} covers {}", token.symbol, balance, amount);
            return Ok(None);
        }

        let shortfall = amount - balance;
        let request = TxRequest::new(token.address, erc20::encode_deposit()?).with_value(shortfall);
        self.executor.execute(StepKind::Wrap, request).await.map(Some)
    }

    /// Approve `spender` for `amount` unless the allowance already covers it
    pub async fn ensure_allowance(
        &self,
        token: &Token,
        spender: Address,
        amount: U256,
    ) -> Result<Option<OperationResult>> {
        if amount.is_zero() {
            return Ok(None);
        }
        let owner = self.executor.owner();
        let current = self.allowance(token.address, owner, spender).await?;
        if current >= amount {
            debug!(
                "{} allowance {} for {:?} covers {}",
                token.symbol, current, spender, amount
            );
            return Ok(None);
        }

        // approve() replaces the allowance, so the full requirement is set
        let request = TxRequest::new(token.address, erc20::encode_approve(spender, amount)?);
        self.executor.execute(StepKind::Approve, request).await.map(Some)
    }

    /// Wrap then approve each requirement in order. Steps confirmed before
    /// a failure are attached to the error.
    pub async fn prepare(
        &self,
        requirements: &[TokenRequirement],
        spender: Address,
    ) -> Result<Vec<OperationResult>> {
        let mut steps = Vec::new();
        for requirement in requirements {
            if requirement.wrap_native {
                match self.ensure_wrapped(&requirement.token, requirement.amount).await {
                    Ok(step) => steps.extend(step),
                    Err(e) => return Err(e.after(steps)),
                }
            }
            match self
                .ensure_allowance(&requirement.token, spender, requirement.amount)
                .await
            {
                Ok(step) => steps.extend(step),
                Err(e) => return Err(e.after(steps)),
            }
        }
        Ok(steps)
    }
}
