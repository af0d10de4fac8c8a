//! Token identity and canonical pool keys

use ethereum_types::Address;
use lp_amm::{AmmError, FeeTier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ERC-20 on a specific chain. `is_native` marks the chain's gas token,
/// which is always handled through its wrapped contract at `address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    #[serde(default)]
    pub is_native: bool,
}

impl Token {
    pub fn new(chain_id: u64, address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: symbol.into(),
            is_native: false,
        }
    }

    /// The chain's native asset, represented by its wrapped contract
    pub fn native(chain_id: u64, wrapped: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            is_native: true,
            ..Self::new(chain_id, wrapped, decimals, symbol)
        }
    }

    /// True when `self` sorts before `other` and so becomes token0
    pub fn sorts_before(&self, other: &Token) -> bool {
        self.address < other.address
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.symbol, self.address)
    }
}

/// Order two tokens into `(token0, token1)`
pub fn sort_tokens<'a>(a: &'a Token, b: &'a Token) -> (&'a Token, &'a Token) {
    if a.sorts_before(b) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Canonical identity of a pool: `token0 < token1` by address, plus fee tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
}

impl PoolKey {
    /// Build a key from either argument order
    pub fn new(token_a: Address, token_b: Address, fee: FeeTier) -> Result<Self, AmmError> {
        if token_a == token_b {
            return Err(AmmError::InvalidParameter {
                name: "token pair",
                reason: format!("both sides are {:?}", token_a),
            });
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(Self { token0, token1, fee })
    }

    pub fn from_tokens(a: &Token, b: &Token, fee: FeeTier) -> Result<Self, AmmError> {
        if a.chain_id != b.chain_id {
            return Err(AmmError::InvalidParameter {
                name: "token pair",
                reason: format!("chain {} vs chain {}", a.chain_id, b.chain_id),
            });
        }
        Self::new(a.address, b.address, fee)
    }

    pub fn tick_spacing(&self) -> i32 {
        self.fee.tick_spacing()
    }

    /// Whether a swap selling `token_in` moves the price down (token0 in)
    pub fn zero_for_one(&self, token_in: Address) -> bool {
        token_in == self.token0
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?} @ {}", self.token0, self.token1, self.fee)
    }
}
