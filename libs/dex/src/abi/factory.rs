//! Pool factory: `getPool` and `createPool`

use super::{decode_output, encode_call, function, param, TokenReader};
use crate::error::Result;
use crate::token::PoolKey;
use ethabi::{Function, ParamType, StateMutability, Token};
use ethereum_types::Address;

/// `getPool(address,address,uint24) returns (address)`
pub fn get_pool() -> Function {
    function(
        "getPool",
        vec![
            param("tokenA", ParamType::Address),
            param("tokenB", ParamType::Address),
            param("fee", ParamType::Uint(24)),
        ],
        vec![param("pool", ParamType::Address)],
        StateMutability::View,
    )
}

/// `createPool(address,address,uint24) returns (address)`
pub fn create_pool() -> Function {
    function(
        "createPool",
        vec![
            param("tokenA", ParamType::Address),
            param("tokenB", ParamType::Address),
            param("fee", ParamType::Uint(24)),
        ],
        vec![param("pool", ParamType::Address)],
        StateMutability::NonPayable,
    )
}

fn key_tokens(key: &PoolKey) -> [Token; 3] {
    [
        Token::Address(key.token0),
        Token::Address(key.token1),
        Token::Uint(key.fee.fee().into()),
    ]
}

pub fn encode_get_pool(key: &PoolKey) -> Result<Vec<u8>> {
    encode_call(&get_pool(), &key_tokens(key))
}

/// Registered pool address, `Address::zero()` when none exists
pub fn decode_get_pool(data: &[u8]) -> Result<Address> {
    let tokens = decode_output(&get_pool(), data)?;
    TokenReader::new("getPool", tokens).address("pool")
}

pub fn encode_create_pool(key: &PoolKey) -> Result<Vec<u8>> {
    encode_call(&create_pool(), &key_tokens(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_amm::FeeTier;

    #[test]
    fn test_factory_selectors() {
        assert_eq!(get_pool().short_signature(), [0x16, 0x98, 0xee, 0x82]);
        assert_eq!(create_pool().short_signature(), [0xa1, 0x67, 0x12, 0x95]);
    }

    #[test]
    fn test_get_pool_calldata_layout() {
        let a = Address::from_low_u64_be(2);
        let b = Address::from_low_u64_be(1);
        let key = PoolKey::new(a, b, FeeTier::Medium).unwrap();
        let data = encode_get_pool(&key).unwrap();

        assert_eq!(data.len(), 4 + 3 * 32);
        // token0 is the lower address regardless of argument order
        assert_eq!(data[4 + 31], 1);
        assert_eq!(data[36 + 31], 2);
        // 3000 = 0x0bb8
        assert_eq!(&data[68 + 30..], &[0x0b, 0xb8]);
    }

    #[test]
    fn test_decode_zero_pool() {
        let encoded = ethabi::encode(&[Token::Address(Address::zero())]);
        assert_eq!(decode_get_pool(&encoded).unwrap(), Address::zero());
        assert!(decode_get_pool(&[]).is_err());
    }
}
