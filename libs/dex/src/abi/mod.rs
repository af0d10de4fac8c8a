//! Contract ABI definitions and calldata codecs
//!
//! Functions are built as ethabi struct literals rather than parsed from JSON
//! so the selectors are fixed at compile time. Each submodule pairs the
//! `Function` definitions with typed encode/decode helpers.

pub mod erc20;
pub mod factory;
pub mod pool;
pub mod position_manager;
pub mod router;

use crate::error::{AbiError, Result};
use ethabi::{Function, Param, ParamType, StateMutability, Token};
use ethereum_types::{Address, U256};

/// `Error(string)` selector used by `require` / `revert("...")`
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// `Panic(uint256)` selector used by failed asserts and arithmetic checks
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

pub(crate) fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

#[allow(deprecated)]
pub(crate) fn function(
    name: &str,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    state_mutability: StateMutability,
) -> Function {
    Function {
        name: name.to_string(),
        inputs,
        outputs,
        constant: None,
        state_mutability,
    }
}

/// Encode a call, mapping ethabi type-check failures
pub(crate) fn encode_call(function: &Function, tokens: &[Token]) -> Result<Vec<u8>> {
    function.encode_input(tokens).map_err(|e| AbiError::Encode {
        function: function.name.clone(),
        message: e.to_string(),
    })
}

/// Decode call output, treating `0x` as its own failure
pub(crate) fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<Token>> {
    if data.is_empty() {
        return Err(AbiError::EmptyResponse {
            function: function.name.clone(),
        });
    }
    function.decode_output(data).map_err(|e| AbiError::Decode {
        function: function.name.clone(),
        message: e.to_string(),
    })
}

/// First four bytes of calldata
pub fn selector_of(calldata: &[u8]) -> Option<[u8; 4]> {
    calldata.get(..4).map(|s| [s[0], s[1], s[2], s[3]])
}

/// Sign-extended two's complement encoding for `int24` arguments
pub fn int24(value: i32) -> Token {
    Token::Int(i32_to_u256(value))
}

pub fn i32_to_u256(value: i32) -> U256 {
    if value >= 0 {
        U256::from(value as u64)
    } else {
        // -x == !(x - 1)
        !U256::from((-(value as i64) - 1) as u64)
    }
}

/// Read back a sign-extended `int24`. Valid for any value that originated
/// from an `int24` slot.
pub fn u256_to_i32(value: U256) -> i32 {
    value.low_u32() as i32
}

/// Sequential reader over decoded output tokens
pub(crate) struct TokenReader {
    function: &'static str,
    tokens: std::vec::IntoIter<Token>,
}

impl TokenReader {
    pub(crate) fn new(function: &'static str, tokens: Vec<Token>) -> Self {
        Self {
            function,
            tokens: tokens.into_iter(),
        }
    }

    fn next(&mut self, field: &str) -> Result<Token> {
        self.tokens
            .next()
            .ok_or_else(|| AbiError::MissingField(format!("{}.{}", self.function, field)))
    }

    pub(crate) fn uint(&mut self, field: &str) -> Result<U256> {
        self.next(field)?
            .into_uint()
            .ok_or_else(|| AbiError::MissingField(format!("{}.{} (uint)", self.function, field)))
    }

    pub(crate) fn int24(&mut self, field: &str) -> Result<i32> {
        self.next(field)?
            .into_int()
            .map(u256_to_i32)
            .ok_or_else(|| AbiError::MissingField(format!("{}.{} (int)", self.function, field)))
    }

    pub(crate) fn address(&mut self, field: &str) -> Result<Address> {
        self.next(field)?
            .into_address()
            .ok_or_else(|| AbiError::MissingField(format!("{}.{} (address)", self.function, field)))
    }

    pub(crate) fn bool(&mut self, field: &str) -> Result<bool> {
        self.next(field)?
            .into_bool()
            .ok_or_else(|| AbiError::MissingField(format!("{}.{} (bool)", self.function, field)))
    }

    pub(crate) fn u128(&mut self, field: &str) -> Result<u128> {
        let value = self.uint(field)?;
        narrow_u128(value, field)
    }

    pub(crate) fn small<T: TryFrom<u64>>(&mut self, field: &str) -> Result<T> {
        let value = self.uint(field)?;
        if value > U256::from(u64::MAX) {
            return Err(overflow(field, value));
        }
        T::try_from(value.as_u64()).map_err(|_| overflow(field, value))
    }
}

pub(crate) fn narrow_u128(value: U256, field: &str) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(overflow(field, value));
    }
    Ok(value.as_u128())
}

fn overflow(field: &str, value: U256) -> AbiError {
    AbiError::ValueOverflow {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Human-readable reason from revert data
///
/// Handles `Error(string)` and `Panic(uint256)`; anything else is reported
/// as raw hex so the caller still has something to log.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let selector = selector_of(data)?;
    let body = &data[4..];

    if selector == ERROR_STRING_SELECTOR {
        return ethabi::decode(&[ParamType::String], body)
            .ok()
            .and_then(|mut tokens| tokens.pop())
            .and_then(Token::into_string);
    }

    if selector == PANIC_SELECTOR {
        let code = ethabi::decode(&[ParamType::Uint(256)], body)
            .ok()
            .and_then(|mut tokens| tokens.pop())
            .and_then(Token::into_uint)?;
        return Some(format!("panic code 0x{:x}", code));
    }

    Some(format!("custom error 0x{}", to_hex(data)))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int24_two_complement() {
        assert_eq!(i32_to_u256(60), U256::from(60u64));
        assert_eq!(i32_to_u256(-1), U256::MAX);
        assert_eq!(i32_to_u256(-60), U256::MAX - U256::from(59u64));
        for tick in [-887272, -60, -1, 0, 1, 60, 887272] {
            assert_eq!(u256_to_i32(i32_to_u256(tick)), tick);
        }
    }

    #[test]
    fn test_decode_error_string() {
        let mut data = ERROR_STRING_SELECTOR.to_vec();
        data.extend(ethabi::encode(&[Token::String("Price slippage check".into())]));
        assert_eq!(
            decode_revert_reason(&data).as_deref(),
            Some("Price slippage check")
        );
    }

    #[test]
    fn test_decode_panic_and_unknown() {
        let mut data = PANIC_SELECTOR.to_vec();
        data.extend(ethabi::encode(&[Token::Uint(U256::from(0x11u64))]));
        assert_eq!(decode_revert_reason(&data).as_deref(), Some("panic code 0x11"));

        assert_eq!(
            decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]).as_deref(),
            Some("custom error 0xdeadbeef")
        );
        assert_eq!(decode_revert_reason(&[0x01]), None);
    }

    #[test]
    fn test_selector_of_short_input() {
        assert_eq!(selector_of(&[1, 2, 3]), None);
        assert_eq!(selector_of(&[1, 2, 3, 4, 5]), Some([1, 2, 3, 4]));
    }
}
