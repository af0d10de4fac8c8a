//! Pool contract reads and `initialize`

use super::{decode_output, encode_call, function, param, TokenReader};
use crate::error::Result;
use ethabi::{Function, ParamType, StateMutability, Token};
use ethereum_types::U256;
use serde::{Deserialize, Serialize};

/// Decoded `slot0()` word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub observation_index: u16,
    pub observation_cardinality: u16,
    pub observation_cardinality_next: u16,
    pub fee_protocol: u8,
    pub unlocked: bool,
}

impl Slot0 {
    /// A pool that was created but never initialized reports a zero price
    pub fn is_initialized(&self) -> bool {
        !self.sqrt_price_x96.is_zero()
    }
}

pub fn slot0() -> Function {
    function(
        "slot0",
        vec![],
        vec![
            param("sqrtPriceX96", ParamType::Uint(160)),
            param("tick", ParamType::Int(24)),
            param("observationIndex", ParamType::Uint(16)),
            param("observationCardinality", ParamType::Uint(16)),
            param("observationCardinalityNext", ParamType::Uint(16)),
            param("feeProtocol", ParamType::Uint(8)),
            param("unlocked", ParamType::Bool),
        ],
        StateMutability::View,
    )
}

pub fn liquidity() -> Function {
    function(
        "liquidity",
        vec![],
        vec![param("", ParamType::Uint(128))],
        StateMutability::View,
    )
}

/// `initialize(uint160 sqrtPriceX96)`
pub fn initialize() -> Function {
    function(
        "initialize",
        vec![param("sqrtPriceX96", ParamType::Uint(160))],
        vec![],
        StateMutability::NonPayable,
    )
}

pub fn encode_slot0() -> Result<Vec<u8>> {
    encode_call(&slot0(), &[])
}

pub fn decode_slot0(data: &[u8]) -> Result<Slot0> {
    let tokens = decode_output(&slot0(), data)?;
    let mut reader = TokenReader::new("slot0", tokens);
    Ok(Slot0 {
        sqrt_price_x96: reader.uint("sqrtPriceX96")?,
        tick: reader.int24("tick")?,
        observation_index: reader.small("observationIndex")?,
        observation_cardinality: reader.small("observationCardinality")?,
        observation_cardinality_next: reader.small("observationCardinalityNext")?,
        fee_protocol: reader.small("feeProtocol")?,
        unlocked: reader.bool("unlocked")?,
    })
}

pub fn encode_liquidity() -> Result<Vec<u8>> {
    encode_call(&liquidity(), &[])
}

pub fn decode_liquidity(data: &[u8]) -> Result<u128> {
    let tokens = decode_output(&liquidity(), data)?;
    TokenReader::new("liquidity", tokens).u128("liquidity")
}

pub fn encode_initialize(sqrt_price_x96: U256) -> Result<Vec<u8>> {
    encode_call(&initialize(), &[Token::Uint(sqrt_price_x96)])
}
