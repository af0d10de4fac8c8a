//! ERC-20 allowance/balance calls and the wrapped-native deposit/withdraw pair

use super::{decode_output, encode_call, function, param, TokenReader};
use crate::error::Result;
use ethabi::{Function, ParamType, StateMutability, Token};
use ethereum_types::{Address, U256};

pub fn allowance() -> Function {
    function(
        "allowance",
        vec![
            param("owner", ParamType::Address),
            param("spender", ParamType::Address),
        ],
        vec![param("", ParamType::Uint(256))],
        StateMutability::View,
    )
}

pub fn approve() -> Function {
    function(
        "approve",
        vec![
            param("spender", ParamType::Address),
            param("amount", ParamType::Uint(256)),
        ],
        vec![param("", ParamType::Bool)],
        StateMutability::NonPayable,
    )
}

/// `balanceOf(address)`; shared by ERC-20 and ERC-721
pub fn balance_of() -> Function {
    function(
        "balanceOf",
        vec![param("owner", ParamType::Address)],
        vec![param("", ParamType::Uint(256))],
        StateMutability::View,
    )
}

/// Wrapped native `deposit()`; the amount travels as call value
pub fn deposit() -> Function {
    function("deposit", vec![], vec![], StateMutability::Payable)
}

/// Wrapped native `withdraw(uint256)`
pub fn withdraw() -> Function {
    function(
        "withdraw",
        vec![param("wad", ParamType::Uint(256))],
        vec![],
        StateMutability::NonPayable,
    )
}

pub fn encode_allowance(owner: Address, spender: Address) -> Result<Vec<u8>> {
    encode_call(&allowance(), &[Token::Address(owner), Token::Address(spender)])
}

pub fn decode_allowance(data: &[u8]) -> Result<U256> {
    let tokens = decode_output(&allowance(), data)?;
    TokenReader::new("allowance", tokens).uint("amount")
}

pub fn encode_approve(spender: Address, amount: U256) -> Result<Vec<u8>> {
    encode_call(&approve(), &[Token::Address(spender), Token::Uint(amount)])
}

pub fn encode_balance_of(owner: Address) -> Result<Vec<u8>> {
    encode_call(&balance_of(), &[Token::Address(owner)])
}

pub fn decode_balance_of(data: &[u8]) -> Result<U256> {
    let tokens = decode_output(&balance_of(), data)?;
    TokenReader::new("balanceOf", tokens).uint("balance")
}

pub fn encode_deposit() -> Result<Vec<u8>> {
    encode_call(&deposit(), &[])
}

pub fn encode_withdraw(amount: U256) -> Result<Vec<u8>> {
    encode_call(&withdraw(), &[Token::Uint(amount)])
}
