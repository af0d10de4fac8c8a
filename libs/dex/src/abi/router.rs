//! Swap router `exactInputSingle` and QuoterV2 `quoteExactInputSingle`

use super::{decode_output, encode_call, function, param, TokenReader};
use crate::error::Result;
use ethabi::{Function, ParamType, StateMutability, Token};
use ethereum_types::{Address, U256};
use lp_amm::FeeTier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactInputSingleParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: FeeTier,
    pub recipient: Address,
    pub deadline: U256,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    /// Zero disables the price limit
    pub sqrt_price_limit_x96: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteExactInputSingleParams {
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub fee: FeeTier,
    pub sqrt_price_limit_x96: U256,
}

/// QuoterV2 result for a single-hop exact-input quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteOutput {
    pub amount_out: U256,
    pub sqrt_price_x96_after: U256,
    pub initialized_ticks_crossed: u32,
    pub gas_estimate: U256,
}

pub fn exact_input_single() -> Function {
    function(
        "exactInputSingle",
        vec![param(
            "params",
            ParamType::Tuple(vec![
                ParamType::Address,
                ParamType::Address,
                ParamType::Uint(24),
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Uint(160),
            ]),
        )],
        vec![param("amountOut", ParamType::Uint(256))],
        StateMutability::Payable,
    )
}

/// QuoterV2 is not a view function on-chain (it reverts internally) but is
/// always invoked through `eth_call`
pub fn quote_exact_input_single() -> Function {
    function(
        "quoteExactInputSingle",
        vec![param(
            "params",
            ParamType::Tuple(vec![
                ParamType::Address,
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Uint(24),
                ParamType::Uint(160),
            ]),
        )],
        vec![
            param("amountOut", ParamType::Uint(256)),
            param("sqrtPriceX96After", ParamType::Uint(160)),
            param("initializedTicksCrossed", ParamType::Uint(32)),
            param("gasEstimate", ParamType::Uint(256)),
        ],
        StateMutability::NonPayable,
    )
}

pub fn encode_exact_input_single(params: &ExactInputSingleParams) -> Result<Vec<u8>> {
    encode_call(
        &exact_input_single(),
        &[Token::Tuple(vec![
            Token::Address(params.token_in),
            Token::Address(params.token_out),
            Token::Uint(params.fee.fee().into()),
            Token::Address(params.recipient),
            Token::Uint(params.deadline),
            Token::Uint(params.amount_in),
            Token::Uint(params.amount_out_minimum),
            Token::Uint(params.sqrt_price_limit_x96),
        ])],
    )
}

pub fn decode_exact_input_single(data: &[u8]) -> Result<U256> {
    let tokens = decode_output(&exact_input_single(), data)?;
    TokenReader::new("exactInputSingle", tokens).uint("amountOut")
}

pub fn encode_quote_exact_input_single(params: &QuoteExactInputSingleParams) -> Result<Vec<u8>> {
    encode_call(
        &quote_exact_input_single(),
        &[Token::Tuple(vec![
            Token::Address(params.token_in),
            Token::Address(params.token_out),
            Token::Uint(params.amount_in),
            Token::Uint(params.fee.fee().into()),
            Token::Uint(params.sqrt_price_limit_x96),
        ])],
    )
}

pub fn decode_quote_exact_input_single(data: &[u8]) -> Result<QuoteOutput> {
    let tokens = decode_output(&quote_exact_input_single(), data)?;
    let mut reader = TokenReader::new("quoteExactInputSingle", tokens);
    Ok(QuoteOutput {
        amount_out: reader.uint("amountOut")?,
        sqrt_price_x96_after: reader.uint("sqrtPriceX96After")?,
        initialized_ticks_crossed: reader.small("initializedTicksCrossed")?,
        gas_estimate: reader.uint("gasEstimate")?,
    })
}
